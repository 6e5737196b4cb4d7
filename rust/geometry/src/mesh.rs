// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Triangle mesh data structure
//!
//! Flat position/normal/index arrays in double precision. Positions stay f64
//! end to end because the interchange format requires round-trip readable
//! coordinates.

use nalgebra::{Matrix4, Point3, Vector3};
use rustc_hash::FxHashMap;

/// Squared cross-product length below which a face counts as degenerate
pub const DEGENERATE_FACE_EPSILON: f64 = 1e-12;

/// Triangle mesh
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions (x, y, z)
    pub positions: Vec<f64>,
    /// Vertex normals (nx, ny, nz)
    pub normals: Vec<f64>,
    /// Triangle indices (i0, i1, i2)
    pub indices: Vec<u32>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mesh with capacity
    pub fn with_capacity(vertex_count: usize, index_count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(vertex_count * 3),
            normals: Vec::with_capacity(vertex_count * 3),
            indices: Vec::with_capacity(index_count),
        }
    }

    /// Add a vertex with normal
    #[inline]
    pub fn add_vertex(&mut self, position: Point3<f64>, normal: Vector3<f64>) {
        self.positions.push(position.x);
        self.positions.push(position.y);
        self.positions.push(position.z);

        self.normals.push(normal.x);
        self.normals.push(normal.y);
        self.normals.push(normal.z);
    }

    /// Add a triangle
    #[inline]
    pub fn add_triangle(&mut self, i0: u32, i1: u32, i2: u32) {
        self.indices.push(i0);
        self.indices.push(i1);
        self.indices.push(i2);
    }

    /// Position of vertex `i`
    #[inline]
    pub fn position(&self, i: usize) -> Point3<f64> {
        Point3::new(
            self.positions[i * 3],
            self.positions[i * 3 + 1],
            self.positions[i * 3 + 2],
        )
    }

    /// Corner positions of triangle `t`
    #[inline]
    pub fn triangle(&self, t: usize) -> (Point3<f64>, Point3<f64>, Point3<f64>) {
        let i0 = self.indices[t * 3] as usize;
        let i1 = self.indices[t * 3 + 1] as usize;
        let i2 = self.indices[t * 3 + 2] as usize;
        (self.position(i0), self.position(i1), self.position(i2))
    }

    /// Merge another mesh into this one
    #[inline]
    pub fn merge(&mut self, other: &TriangleMesh) {
        if other.is_empty() {
            return;
        }

        let vertex_offset = (self.positions.len() / 3) as u32;

        self.positions.reserve(other.positions.len());
        self.normals.reserve(other.normals.len());
        self.indices.reserve(other.indices.len());

        self.positions.extend_from_slice(&other.positions);
        self.normals.extend_from_slice(&other.normals);
        self.indices
            .extend(other.indices.iter().map(|&i| i + vertex_offset));
    }

    /// Get vertex count
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    /// Get triangle count
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Check if mesh is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Calculate bounds (min, max)
    #[inline]
    pub fn bounds(&self) -> (Point3<f64>, Point3<f64>) {
        if self.is_empty() {
            return (Point3::origin(), Point3::origin());
        }

        let mut min = Point3::new(f64::MAX, f64::MAX, f64::MAX);
        let mut max = Point3::new(f64::MIN, f64::MIN, f64::MIN);

        self.positions.chunks_exact(3).for_each(|chunk| {
            let (x, y, z) = (chunk[0], chunk[1], chunk[2]);
            min.x = min.x.min(x);
            min.y = min.y.min(y);
            min.z = min.z.min(z);
            max.x = max.x.max(x);
            max.y = max.y.max(y);
            max.z = max.z.max(z);
        });

        (min, max)
    }

    /// Transform positions and normals by a matrix.
    ///
    /// Normals use the inverse-transpose so non-uniform components keep them
    /// perpendicular.
    pub fn transform(&mut self, transform: &Matrix4<f64>) {
        self.positions.chunks_exact_mut(3).for_each(|chunk| {
            let point = Point3::new(chunk[0], chunk[1], chunk[2]);
            let t = transform.transform_point(&point);
            chunk[0] = t.x;
            chunk[1] = t.y;
            chunk[2] = t.z;
        });

        let normal_matrix = transform.try_inverse().unwrap_or(*transform).transpose();
        self.normals.chunks_exact_mut(3).for_each(|chunk| {
            let normal = Vector3::new(chunk[0], chunk[1], chunk[2]);
            let t = (normal_matrix * normal.to_homogeneous()).xyz();
            let t = t.try_normalize(1e-12).unwrap_or(normal);
            chunk[0] = t.x;
            chunk[1] = t.y;
            chunk[2] = t.z;
        });
    }

    /// Shift all positions by a translation
    pub fn translate(&mut self, offset: &Vector3<f64>) {
        self.positions.chunks_exact_mut(3).for_each(|chunk| {
            chunk[0] += offset.x;
            chunk[1] += offset.y;
            chunk[2] += offset.z;
        });
    }

    /// Recompute per-vertex normals by accumulating face normals
    pub fn recompute_normals(&mut self) {
        let vertex_count = self.vertex_count();
        if vertex_count == 0 {
            return;
        }

        let mut accumulated = vec![Vector3::zeros(); vertex_count];

        for t in 0..self.triangle_count() {
            let (v0, v1, v2) = self.triangle(t);
            let normal = (v1 - v0).cross(&(v2 - v0));
            accumulated[self.indices[t * 3] as usize] += normal;
            accumulated[self.indices[t * 3 + 1] as usize] += normal;
            accumulated[self.indices[t * 3 + 2] as usize] += normal;
        }

        self.normals.clear();
        self.normals.reserve(vertex_count * 3);
        for normal in accumulated {
            let n = normal.try_normalize(1e-12).unwrap_or_else(Vector3::z);
            self.normals.push(n.x);
            self.normals.push(n.y);
            self.normals.push(n.z);
        }
    }

    /// Weld near-coincident vertices on an epsilon grid.
    ///
    /// Merges seam vertices left over from concatenating independently
    /// tessellated parts and drops faces that collapse in the process.
    /// Normals are invalidated; call [`TriangleMesh::recompute_normals`]
    /// afterwards.
    pub fn weld(&mut self, epsilon: f64) {
        if self.is_empty() || epsilon <= 0.0 {
            return;
        }

        let quantize = |v: f64| (v / epsilon).round() as i64;

        let mut remap = vec![0u32; self.vertex_count()];
        let mut first_at: FxHashMap<(i64, i64, i64), u32> = FxHashMap::default();
        let mut positions = Vec::with_capacity(self.positions.len());

        for i in 0..self.vertex_count() {
            let p = self.position(i);
            let key = (quantize(p.x), quantize(p.y), quantize(p.z));
            match first_at.get(&key) {
                Some(&kept) => remap[i] = kept,
                None => {
                    let kept = (positions.len() / 3) as u32;
                    first_at.insert(key, kept);
                    positions.push(p.x);
                    positions.push(p.y);
                    positions.push(p.z);
                    remap[i] = kept;
                }
            }
        }

        let mut indices = Vec::with_capacity(self.indices.len());
        for tri in self.indices.chunks_exact(3) {
            let (a, b, c) = (remap[tri[0] as usize], remap[tri[1] as usize], remap[tri[2] as usize]);
            if a == b || b == c || c == a {
                continue; // collapsed by welding
            }
            indices.push(a);
            indices.push(b);
            indices.push(c);
        }

        self.positions = positions;
        self.indices = indices;
        self.normals.clear();
    }

    /// Clear the mesh
    #[inline]
    pub fn clear(&mut self) {
        self.positions.clear();
        self.normals.clear();
        self.indices.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mesh_creation() {
        let mesh = TriangleMesh::new();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_add_vertex() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.0, 0.0, 1.0));
        assert_eq!(mesh.vertex_count(), 1);
        assert_eq!(mesh.positions, vec![1.0, 2.0, 3.0]);
        assert_eq!(mesh.normals, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_merge_offsets_indices() {
        let mut mesh1 = TriangleMesh::new();
        mesh1.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        mesh1.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        mesh1.add_vertex(Point3::new(0.0, 1.0, 0.0), Vector3::z());
        mesh1.add_triangle(0, 1, 2);

        let mut mesh2 = TriangleMesh::new();
        mesh2.add_vertex(Point3::new(2.0, 0.0, 0.0), Vector3::z());
        mesh2.add_vertex(Point3::new(3.0, 0.0, 0.0), Vector3::z());
        mesh2.add_vertex(Point3::new(2.0, 1.0, 0.0), Vector3::z());
        mesh2.add_triangle(0, 1, 2);

        mesh1.merge(&mesh2);
        assert_eq!(mesh1.vertex_count(), 6);
        assert_eq!(mesh1.triangle_count(), 2);
        assert_eq!(&mesh1.indices[3..], &[3, 4, 5]);
    }

    #[test]
    fn test_transform_rotates_normals() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::z());

        // Rotating +90 degrees about X sends +Z to -Y
        let rot = Matrix4::from_axis_angle(&Vector3::x_axis(), std::f64::consts::FRAC_PI_2);
        mesh.transform(&rot);

        assert_relative_eq!(mesh.normals[1], -1.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.normals[2], 0.0, epsilon = 1e-12);
        assert_relative_eq!(mesh.positions[0], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_weld_merges_seam_vertices() {
        let mut mesh = TriangleMesh::new();
        // Two triangles sharing an edge, but with duplicated edge vertices.
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(1.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(1.0, 0.0, 1e-9), Vector3::z());
        mesh.add_vertex(Point3::new(0.0, 1.0, -1e-9), Vector3::z());
        mesh.add_vertex(Point3::new(1.0, 1.0, 0.0), Vector3::z());
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(3, 5, 4);

        mesh.weld(1e-6);
        mesh.recompute_normals();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
    }

    #[test]
    fn test_weld_drops_collapsed_faces() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Point3::new(0.0, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(1e-9, 0.0, 0.0), Vector3::z());
        mesh.add_vertex(Point3::new(0.0, 1.0, 0.0), Vector3::z());
        mesh.add_triangle(0, 1, 2);

        mesh.weld(1e-6);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_bounds() {
        let mut mesh = TriangleMesh::new();
        mesh.add_vertex(Point3::new(-1.0, 2.0, -3.0), Vector3::z());
        mesh.add_vertex(Point3::new(4.0, -5.0, 6.0), Vector3::z());

        let (min, max) = mesh.bounds();
        assert_eq!(min, Point3::new(-1.0, -5.0, -3.0));
        assert_eq!(max, Point3::new(4.0, 2.0, 6.0));
    }
}
