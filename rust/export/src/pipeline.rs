// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The export pipeline: flatten, classify, tessellate, assemble, clip,
//! serialize.
//!
//! One document in, one document out. Tessellation fans out over rayon but
//! results rejoin in input order, so two runs over the same document produce
//! byte-identical output. Everything downstream of tessellation is serial.

use crate::attributes::{build_tables, SideTables};
use crate::error::Result;
use crate::stl::{serialize_solids, ClippedSolid, SerializedDocument};
use rayon::prelude::*;
use tracing::{debug, info, warn};
use urbanstl_geometry::{
    assemble, flatten_document, AssembleOptions, BuiltinTessellator, ClipStats, DatumPlane,
    GeometryNode, MeshingParams, PlaneClipper, TessellatedNode, Tessellator,
};
use urbanstl_scene::{
    Category, ClassificationMode, LayerCategoryMap, ObjectId, SceneDocument,
};

/// Export configuration
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    pub mode: ClassificationMode,
    /// Fold the `other` fallback bucket into the building stem
    pub other_as_building: bool,
    pub meshing: MeshingParams,
    pub assembly: AssembleOptions,
}

/// Non-fatal bookkeeping for one export run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub solids_written: usize,
    pub facets_written: usize,
    /// Clip candidates rejected as degenerate, summed over all groups
    pub degenerate_rejected: usize,
    /// Groups that clipped down to nothing and were omitted
    pub empty_solids: Vec<(Category, ObjectId)>,
    /// Instance subtrees abandoned because of definition cycles
    pub cyclic_rejections: usize,
}

/// Result of one export run
#[derive(Debug)]
pub struct ExportOutcome {
    /// The solid document, or `None` when no exportable geometry was found
    pub document: Option<String>,
    pub tables: SideTables,
    pub report: ExportReport,
}

/// Runs the export pipeline over scene documents
pub struct Exporter {
    options: ExportOptions,
    tessellator: Box<dyn Tessellator>,
}

impl Exporter {
    /// Create an exporter using the built-in tessellator
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            tessellator: Box::new(BuiltinTessellator),
        }
    }

    /// Create an exporter around a host-provided tessellation capability
    pub fn with_tessellator(options: ExportOptions, tessellator: Box<dyn Tessellator>) -> Self {
        Self {
            options,
            tessellator,
        }
    }

    /// Run the full pipeline over one document
    pub fn run(&self, doc: &SceneDocument) -> Result<ExportOutcome> {
        let mut report = ExportReport::default();

        // Flatten instance references into world-space nodes
        let outcome = flatten_document(doc)?;
        report.cyclic_rejections = outcome.cyclic_rejections;
        if outcome.cyclic_rejections > 0 {
            warn!(
                rejected = outcome.cyclic_rejections,
                "cyclic instance definitions skipped"
            );
        }
        info!(nodes = outcome.nodes.len(), "scene flattened");

        // Classify against the layer vocabulary
        let layer_map = LayerCategoryMap::build(&doc.layers);
        let classified: Vec<(Category, &GeometryNode)> = outcome
            .nodes
            .iter()
            .map(|node| (layer_map.classify(node.layer, &doc.layers), node))
            .filter(|(category, _)| match self.options.mode {
                ClassificationMode::All => true,
                ClassificationMode::BuildingsOnly => *category == Category::Buildings,
            })
            .collect();

        // Tessellate in parallel; collect() preserves input order so the
        // rejoin is deterministic regardless of scheduling
        let tessellated: Result<Vec<TessellatedNode>> = classified
            .par_iter()
            .map(|&(category, node)| {
                let mut meshes = self
                    .tessellator
                    .tessellate(&node.renderable, &self.options.meshing)?;
                for mesh in &mut meshes {
                    mesh.transform(&node.transform);
                }
                Ok(TessellatedNode::new(category, node, meshes))
            })
            .collect();
        let tessellated = tessellated?;

        // Merge into solid groups in output space
        let groups = assemble(tessellated, &self.options.assembly);
        info!(groups = groups.len(), "solid groups assembled");

        // Clip each group against the ground plane
        let clipper = PlaneClipper::new(DatumPlane::ground());
        let mut clipped = Vec::with_capacity(groups.len());
        for group in groups {
            let (facets, stats) = clipper.clip_mesh(&group.mesh);
            debug!(
                category = ?group.category,
                source = group.source.0,
                facets = facets.len(),
                "group clipped"
            );
            accumulate_stats(&mut report, &stats);
            clipped.push(ClippedSolid {
                category: group.category,
                source: group.source,
                facets,
                properties: group.properties,
            });
        }

        // Serialize the survivors
        let serialized = serialize_solids(&clipped, self.options.other_as_building);
        finish_report(&mut report, &serialized);

        if serialized.emitted.is_empty() {
            info!("no exportable geometry found");
            return Ok(ExportOutcome {
                document: None,
                tables: SideTables::default(),
                report,
            });
        }

        let tables = build_tables(&serialized.emitted);
        info!(
            solids = report.solids_written,
            facets = report.facets_written,
            "export serialized"
        );

        Ok(ExportOutcome {
            document: Some(serialized.text),
            tables,
            report,
        })
    }
}

fn accumulate_stats(report: &mut ExportReport, stats: &ClipStats) {
    report.degenerate_rejected += stats.degenerate_rejected;
}

fn finish_report(report: &mut ExportReport, serialized: &SerializedDocument) {
    report.solids_written = serialized.emitted.len();
    report.facets_written = serialized.emitted.iter().map(|s| s.facet_count).sum();
    report.empty_solids = serialized.empty_skipped.clone();
    for (category, source) in &report.empty_solids {
        warn!(?category, source = source.0, "solid clipped to nothing, omitted");
    }
}
