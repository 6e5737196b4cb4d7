// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Command-surface facade: one document in, files out, a status back.

use crate::pipeline::{Exporter, ExportOptions};
use std::path::Path;
use tracing::error;

/// Outcome of one export command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStatus {
    /// The document was written
    Success,
    /// The user aborted; reserved for interactive front ends, the library
    /// itself never produces it
    Cancel,
    /// The input could not be processed or the output could not be written
    Failure,
    /// Ran to completion but found zero exportable geometry; no file written
    Nothing,
}

/// Run a full export: write the solid document to `output`, and each
/// non-empty attribute table next to it as `<stem>_<family>.csv`.
///
/// All recoverable conditions degrade into a partial-but-valid document; only
/// I/O and document-level failures surface as [`ExportStatus::Failure`].
pub fn run_export(doc: &urbanstl_scene::SceneDocument, output: &Path, options: ExportOptions) -> ExportStatus {
    let exporter = Exporter::new(options);
    let outcome = match exporter.run(doc) {
        Ok(outcome) => outcome,
        Err(e) => {
            error!(error = %e, "export failed");
            return ExportStatus::Failure;
        }
    };

    let Some(document) = outcome.document else {
        return ExportStatus::Nothing;
    };

    if let Err(e) = std::fs::write(output, document) {
        error!(error = %e, path = %output.display(), "cannot write solid document");
        return ExportStatus::Failure;
    }

    let tables = [
        ("vegetation", outcome.tables.vegetation),
        ("road", outcome.tables.roads),
        ("water", outcome.tables.waters),
        ("building", outcome.tables.buildings),
    ];
    for (family, table) in tables {
        let Some(table) = table else { continue };
        let path = sibling_table_path(output, family);
        if let Err(e) = std::fs::write(&path, table) {
            error!(error = %e, path = %path.display(), "cannot write attribute table");
            return ExportStatus::Failure;
        }
    }

    ExportStatus::Success
}

/// `<dir>/<stem>_<family>.csv` next to the solid document
fn sibling_table_path(output: &Path, family: &str) -> std::path::PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    output.with_file_name(format!("{stem}_{family}.csv"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_table_path() {
        let path = sibling_table_path(Path::new("/tmp/city.stl"), "vegetation");
        assert_eq!(path, Path::new("/tmp/city_vegetation.csv"));
    }
}
