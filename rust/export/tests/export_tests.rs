// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! End-to-end export scenarios over in-memory documents.

use approx::assert_relative_eq;
use urbanstl_export::{run_export, ExportOptions, ExportStatus, Exporter};
use urbanstl_geometry::Point3;
use urbanstl_scene::{ClassificationMode, MeshData, Renderable, SceneDocument};

/// Scene-space box (Z up): `z` is the height axis before reorientation
fn box_object(doc: &mut SceneDocument, layer: &str, min: [f64; 3], max: [f64; 3]) {
    let layer = doc.layers.add(layer, None).unwrap();
    doc.add_object(
        "box",
        layer,
        Renderable::Mesh(MeshData::cuboid(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )),
    )
    .unwrap();
}

fn facet_count(document: &str) -> usize {
    document.matches("facet normal").count()
}

/// Vertex y coordinates of every emitted facet
fn vertex_heights(document: &str) -> Vec<f64> {
    document
        .lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("vertex ")?;
            let mut parts = rest.split_whitespace();
            parts.next()?;
            parts.next()?.parse::<f64>().ok()
        })
        .collect()
}

#[test]
fn building_above_ground_exports_uncut() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Buildings", [0.0, 0.0, 2.0], [1.0, 1.0, 3.0]);

    let outcome = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
    let document = outcome.document.unwrap();

    assert!(document.starts_with("solid building1\n"));
    assert!(document.trim_end().ends_with("endsolid building1"));
    assert_eq!(facet_count(&document), 12);
    assert_eq!(outcome.report.solids_written, 1);
    assert_eq!(outcome.report.degenerate_rejected, 0);
    assert!(outcome.report.empty_solids.is_empty());

    // The cube sat at height 2..3 and must not have been clipped
    let heights = vertex_heights(&document);
    assert!(heights.iter().all(|&y| y >= 2.0 - 1e-9 && y <= 3.0 + 1e-9));
}

#[test]
fn straddling_ground_box_is_clipped_at_datum() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Grounds", [0.0, 0.0, -1.0], [2.0, 2.0, 1.0]);

    let outcome = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
    let document = outcome.document.unwrap();

    assert!(document.contains("solid ground1"));

    // Nothing below the datum plane survives
    let heights = vertex_heights(&document);
    assert!(!heights.is_empty());
    assert!(heights.iter().all(|&y| y >= -1e-9));
    // The cut boundary lies exactly on the plane
    assert!(heights.iter().any(|&y| y == 0.0));
    assert!(heights.iter().any(|&y| (y - 1.0).abs() < 1e-9));
}

#[test]
fn unclassified_object_falls_to_other_or_is_excluded() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Default", [0.0, 0.0, 1.0], [1.0, 1.0, 2.0]);
    box_object(&mut doc, "Buildings", [5.0, 0.0, 1.0], [6.0, 1.0, 2.0]);

    let all = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
    let document = all.document.unwrap();
    assert!(document.contains("solid building1"));
    assert!(document.contains("solid other1"));

    let buildings_only = Exporter::new(ExportOptions {
        mode: ClassificationMode::BuildingsOnly,
        ..ExportOptions::default()
    })
    .run(&doc)
    .unwrap();
    let document = buildings_only.document.unwrap();
    assert!(document.contains("solid building1"));
    assert!(!document.contains("other"));
}

#[test]
fn other_bucket_can_remap_to_building_stem() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Default", [0.0, 0.0, 1.0], [1.0, 1.0, 2.0]);

    let outcome = Exporter::new(ExportOptions {
        other_as_building: true,
        ..ExportOptions::default()
    })
    .run(&doc)
    .unwrap();

    assert!(outcome.document.unwrap().contains("solid building1"));
}

#[test]
fn empty_document_reports_nothing_and_writes_no_file() {
    let doc = SceneDocument::new();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("city.stl");
    let status = run_export(&doc, &path, ExportOptions::default());

    assert_eq!(status, ExportStatus::Nothing);
    assert!(!path.exists());
}

#[test]
fn fully_buried_geometry_reports_nothing() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Buildings", [0.0, 0.0, -5.0], [1.0, 1.0, -2.0]);

    let outcome = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
    assert!(outcome.document.is_none());
    assert_eq!(outcome.report.empty_solids.len(), 1);
}

#[test]
fn export_writes_document_and_attribute_tables() {
    let mut doc = SceneDocument::new();
    let trees = doc.layers.add("Trees", None).unwrap();
    let id = doc
        .add_object(
            "oak",
            trees,
            Renderable::Mesh(MeshData::cuboid(
                Point3::new(0.0, 0.0, 0.5),
                Point3::new(1.0, 1.0, 4.0),
            )),
        )
        .unwrap();
    doc.object_mut(id)
        .unwrap()
        .properties
        .insert("type", "oak");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("city.stl");
    let status = run_export(&doc, &path, ExportOptions::default());

    assert_eq!(status, ExportStatus::Success);
    let document = std::fs::read_to_string(&path).unwrap();
    assert!(document.contains("solid tree1"));

    let table = std::fs::read_to_string(dir.path().join("city_vegetation.csv")).unwrap();
    assert!(table.contains("tree1,oak,default,default"));
}

#[test]
fn rerunning_the_pipeline_is_byte_identical() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Buildings", [0.0, 0.0, -0.5], [3.0, 2.0, 10.0]);
    box_object(&mut doc, "Roads", [-4.0, -4.0, -0.1], [4.0, 4.0, 0.1]);
    box_object(&mut doc, "Grasses", [1.0, 1.0, -0.2], [2.0, 2.0, 0.3]);

    let run = || {
        Exporter::new(ExportOptions::default())
            .run(&doc)
            .unwrap()
            .document
            .unwrap()
    };

    assert_eq!(run(), run());
}

#[test]
fn clip_conserves_straddling_wall_area() {
    let mut doc = SceneDocument::new();
    box_object(&mut doc, "Waters", [0.0, 0.0, -1.0], [2.0, 2.0, 1.0]);

    let outcome = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
    let document = outcome.document.unwrap();

    // Surviving surface: 2x2 top cap plus four 2x1 wall strips
    let mut area = 0.0;
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    for line in document.lines() {
        if let Some(rest) = line.trim().strip_prefix("vertex ") {
            let coords: Vec<f64> = rest
                .split_whitespace()
                .map(|v| v.parse().unwrap())
                .collect();
            vertices.push(Point3::new(coords[0], coords[1], coords[2]));
            if vertices.len() == 3 {
                let (a, b, c) = (vertices[0], vertices[1], vertices[2]);
                area += (b - a).cross(&(c - a)).norm() * 0.5;
                vertices.clear();
            }
        }
    }
    assert_relative_eq!(area, 4.0 + 4.0 * 2.0, epsilon = 1e-9);
}
