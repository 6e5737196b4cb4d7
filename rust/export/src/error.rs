// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

/// Result type for export operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while exporting a document
#[derive(Error, Debug)]
pub enum Error {
    /// The input document could not be opened or understood.
    /// Fatal: surfaced before any processing happens.
    #[error("Cannot open document: {0}")]
    DocumentOpen(String),

    #[error("Geometry error: {0}")]
    Geometry(#[from] urbanstl_geometry::Error),

    #[error("Scene model error: {0}")]
    Scene(#[from] urbanstl_scene::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
