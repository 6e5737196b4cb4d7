// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Solid assembly: tessellated nodes merged into per-(category, object)
//! solid groups in output space.
//!
//! The scene is Z-up; output space is Y-up with the ground plane at y = 0.
//! Assembly re-orients, recenters the horizontal footprint, welds seams from
//! concatenated sub-meshes and enforces upward-facing winding for the
//! ground-hugging categories.

use crate::flatten::GeometryNode;
use crate::mesh::TriangleMesh;
use nalgebra::{Matrix4, Vector3};
use rustc_hash::FxHashMap;
use urbanstl_scene::{Category, ObjectId, PropertyMap};

/// One tessellated node entering assembly
#[derive(Debug)]
pub struct TessellatedNode {
    pub category: Category,
    pub source: ObjectId,
    pub properties: PropertyMap,
    pub meshes: Vec<TriangleMesh>,
}

impl TessellatedNode {
    /// Pair a flattened node's identity with its tessellation output
    pub fn new(category: Category, node: &GeometryNode, meshes: Vec<TriangleMesh>) -> Self {
        Self {
            category,
            source: node.source,
            properties: node.properties.clone(),
            meshes,
        }
    }
}

/// The unit of output: one merged mesh per (category, source object)
#[derive(Debug)]
pub struct SolidGroup {
    pub category: Category,
    pub source: ObjectId,
    pub mesh: TriangleMesh,
    pub properties: PropertyMap,
}

/// How the horizontal footprint is recentered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecenterMode {
    /// Shift x/z so the footprint is centered at the origin; y untouched
    #[default]
    HorizontalOnly,
    /// Leave coordinates where the scene put them
    None,
}

/// Assembly configuration
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    pub recenter: RecenterMode,
    /// Weld near-coincident seam vertices from merged sub-meshes
    pub weld: bool,
    pub weld_tolerance: f64,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            recenter: RecenterMode::HorizontalOnly,
            weld: true,
            weld_tolerance: 1e-6,
        }
    }
}

/// Rotation taking scene space (Z up) into output space (Y up):
/// `(x, y, z) -> (x, z, -y)`
pub fn scene_to_output_transform() -> Matrix4<f64> {
    Matrix4::from_axis_angle(&Vector3::x_axis(), -std::f64::consts::FRAC_PI_2)
}

/// Merge tessellated nodes into finalized solid groups.
///
/// Groups come out ordered by category (fixed enumeration order), then by
/// source object id, so downstream naming is reproducible.
pub fn assemble(nodes: Vec<TessellatedNode>, options: &AssembleOptions) -> Vec<SolidGroup> {
    let mut groups: FxHashMap<(usize, ObjectId), SolidGroup> = FxHashMap::default();

    for node in nodes {
        let key = (node.category.index(), node.source);
        let group = groups.entry(key).or_insert_with(|| SolidGroup {
            category: node.category,
            source: node.source,
            mesh: TriangleMesh::new(),
            properties: PropertyMap::new(),
        });
        for mesh in &node.meshes {
            group.mesh.merge(mesh);
        }
        // First defined value wins across the group's nodes
        group.properties = group.properties.merged_over(&node.properties);
    }

    let mut groups: Vec<SolidGroup> = groups.into_values().collect();
    groups.sort_by_key(|g| (g.category.index(), g.source));
    groups.retain(|g| !g.mesh.is_empty());

    let reorient = scene_to_output_transform();
    for group in &mut groups {
        group.mesh.transform(&reorient);
        if options.weld {
            group.mesh.weld(options.weld_tolerance);
        }
        if group.category.needs_upward_winding() {
            correct_upward_winding(&mut group.mesh);
        }
        // Full recompute after all winding swaps keeps normals consistent
        group.mesh.recompute_normals();
    }

    if options.recenter == RecenterMode::HorizontalOnly && !groups.is_empty() {
        let offset = horizontal_center_offset(groups.iter().map(|g| &g.mesh));
        for group in &mut groups {
            group.mesh.translate(&offset);
        }
    }

    groups
}

/// Reverse every face whose normal points below the horizon.
///
/// Ground-hugging categories must face upward; a downward face gets two of
/// its indices swapped. Normals are not touched here — callers recompute
/// them once after all swaps.
fn correct_upward_winding(mesh: &mut TriangleMesh) {
    for t in 0..mesh.triangle_count() {
        let (v0, v1, v2) = mesh.triangle(t);
        let normal = (v1 - v0).cross(&(v2 - v0));
        if normal.y < 0.0 {
            mesh.indices.swap(t * 3 + 1, t * 3 + 2);
        }
    }
}

/// Translation that centers the combined x/z footprint at the origin
fn horizontal_center_offset<'a>(meshes: impl Iterator<Item = &'a TriangleMesh>) -> Vector3<f64> {
    let mut min_x = f64::MAX;
    let mut max_x = f64::MIN;
    let mut min_z = f64::MAX;
    let mut max_z = f64::MIN;

    let mut any = false;
    for mesh in meshes {
        if mesh.is_empty() {
            continue;
        }
        any = true;
        let (min, max) = mesh.bounds();
        min_x = min_x.min(min.x);
        max_x = max_x.max(max.x);
        min_z = min_z.min(min.z);
        max_z = max_z.max(max.z);
    }
    if !any {
        return Vector3::zeros();
    }

    Vector3::new(-(min_x + max_x) * 0.5, 0.0, -(min_z + max_z) * 0.5)
}
