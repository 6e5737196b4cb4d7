// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The closed set of renderable geometry payloads.
//!
//! Everything an object can carry is one of these variants; the export
//! pipeline never meets geometry outside this set. Instance references are
//! resolved away during flattening, all other variants reach the tessellator.

use crate::instance::DefinitionId;
use nalgebra::{Matrix4, Point2, Point3};

/// A mesh face, triangular or quadrangular.
///
/// Quads are split into two triangles during tessellation; they never survive
/// past that stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    Triangle([u32; 3]),
    Quad([u32; 4]),
}

/// Raw mesh payload: vertex positions plus triangle/quad faces
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Point3<f64>>,
    pub faces: Vec<Face>,
}

impl MeshData {
    /// Create an empty mesh payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that every face index is in range
    pub fn indices_in_range(&self) -> bool {
        let n = self.vertices.len() as u32;
        self.faces.iter().all(|f| match f {
            Face::Triangle(idx) => idx.iter().all(|&i| i < n),
            Face::Quad(idx) => idx.iter().all(|&i| i < n),
        })
    }

    /// Axis-aligned box between `min` and `max`, six quad faces wound
    /// counter-clockwise when viewed from outside.
    pub fn cuboid(min: Point3<f64>, max: Point3<f64>) -> Self {
        let v = [
            Point3::new(min.x, min.y, min.z), // 0
            Point3::new(max.x, min.y, min.z), // 1
            Point3::new(max.x, max.y, min.z), // 2
            Point3::new(min.x, max.y, min.z), // 3
            Point3::new(min.x, min.y, max.z), // 4
            Point3::new(max.x, min.y, max.z), // 5
            Point3::new(max.x, max.y, max.z), // 6
            Point3::new(min.x, max.y, max.z), // 7
        ];
        let faces = vec![
            Face::Quad([0, 3, 2, 1]), // bottom (z = min.z), facing -Z
            Face::Quad([4, 5, 6, 7]), // top (z = max.z), facing +Z
            Face::Quad([0, 1, 5, 4]), // front (y = min.y), facing -Y
            Face::Quad([2, 3, 7, 6]), // back (y = max.y), facing +Y
            Face::Quad([0, 4, 7, 3]), // left (x = min.x), facing -X
            Face::Quad([1, 2, 6, 5]), // right (x = max.x), facing +X
        ];
        Self {
            vertices: v.to_vec(),
            faces,
        }
    }
}

/// One planar face of a boundary representation: outer loop plus hole loops
#[derive(Debug, Clone)]
pub struct BrepFace {
    pub outer: Vec<Point3<f64>>,
    pub holes: Vec<Vec<Point3<f64>>>,
}

/// Boundary-representation solid as a set of planar faces
#[derive(Debug, Clone, Default)]
pub struct Brep {
    pub faces: Vec<BrepFace>,
}

/// Linear extrusion of a 2D profile along local +Z, then placed by `transform`
#[derive(Debug, Clone)]
pub struct Extrusion {
    /// Outer profile boundary in the local XY plane
    pub profile: Vec<Point2<f64>>,
    /// Hole boundaries in the local XY plane
    pub holes: Vec<Vec<Point2<f64>>>,
    /// Extrusion depth along local +Z; must be positive
    pub depth: f64,
    /// Placement from local extrusion space into object space
    pub transform: Matrix4<f64>,
}

/// Parametric surface patch: a control-point grid evaluated bilinearly.
///
/// `control` holds `rows * cols` points in row-major order; tessellation
/// density is chosen from the meshing parameters.
#[derive(Debug, Clone)]
pub struct SurfacePatch {
    pub control: Vec<Point3<f64>>,
    pub cols: usize,
    pub rows: usize,
}

impl SurfacePatch {
    /// Evaluate the patch at normalized parameters `(u, v)` in `[0, 1]²`.
    ///
    /// Bilinear interpolation inside the grid cell containing `(u, v)`.
    pub fn point_at(&self, u: f64, v: f64) -> Point3<f64> {
        debug_assert!(self.cols >= 2 && self.rows >= 2);
        debug_assert_eq!(self.control.len(), self.cols * self.rows);

        let u = u.clamp(0.0, 1.0) * (self.cols - 1) as f64;
        let v = v.clamp(0.0, 1.0) * (self.rows - 1) as f64;
        let ci = (u.floor() as usize).min(self.cols - 2);
        let ri = (v.floor() as usize).min(self.rows - 2);
        let fu = u - ci as f64;
        let fv = v - ri as f64;

        let p00 = self.control[ri * self.cols + ci];
        let p10 = self.control[ri * self.cols + ci + 1];
        let p01 = self.control[(ri + 1) * self.cols + ci];
        let p11 = self.control[(ri + 1) * self.cols + ci + 1];

        let bottom = p00 + (p10 - p00) * fu;
        let top = p01 + (p11 - p01) * fu;
        bottom + (top - bottom) * fv
    }
}

/// Reference to an instance definition with its placement transform
#[derive(Debug, Clone)]
pub struct InstanceRef {
    pub definition: DefinitionId,
    pub transform: Matrix4<f64>,
}

/// Closed polymorphic set of geometry an object can carry
#[derive(Debug, Clone)]
pub enum Renderable {
    Mesh(MeshData),
    Brep(Brep),
    Extrusion(Extrusion),
    Surface(SurfacePatch),
    Instance(InstanceRef),
}

impl Renderable {
    /// Check if this is an instance reference (resolved during flattening)
    pub fn is_instance(&self) -> bool {
        matches!(self, Renderable::Instance(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cuboid_indices() {
        let mesh = MeshData::cuboid(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 6);
        assert!(mesh.indices_in_range());
    }

    #[test]
    fn test_patch_corners() {
        let patch = SurfacePatch {
            control: vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                Point3::new(0.0, 2.0, 1.0),
                Point3::new(2.0, 2.0, 1.0),
            ],
            cols: 2,
            rows: 2,
        };
        assert_eq!(patch.point_at(0.0, 0.0), Point3::new(0.0, 0.0, 0.0));
        assert_eq!(patch.point_at(1.0, 1.0), Point3::new(2.0, 2.0, 1.0));
        let mid = patch.point_at(0.5, 0.5);
        assert!((mid.z - 0.5).abs() < 1e-12);
    }
}
