// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Datum-plane clipping
//!
//! Every triangle is cut against the horizontal ground plane: geometry below
//! is discarded, straddling triangles are re-triangulated along the cut, and
//! every surviving facet gets a normal freshly derived from its clipped
//! corners. Nothing degenerate or non-finite leaves this stage.

use crate::mesh::{TriangleMesh, DEGENERATE_FACE_EPSILON};
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

/// Vertices closer to the plane than this snap exactly onto it
pub const SNAP_EPSILON: f64 = 1e-8;

/// Edge height differences below this fall back to midpoint interpolation
const FLAT_EDGE_EPSILON: f64 = 1e-12;

/// The horizontal plane `y = height` everything is clipped against
#[derive(Debug, Clone, Copy)]
pub struct DatumPlane {
    pub height: f64,
}

impl DatumPlane {
    /// The ground plane `y = 0`
    pub fn ground() -> Self {
        Self { height: 0.0 }
    }

    /// Signed vertical distance from the plane
    #[inline]
    pub fn signed_distance(&self, point: &Point3<f64>) -> f64 {
        point.y - self.height
    }
}

/// One clipped output triangle: three corners plus a unit normal
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Facet {
    pub a: Point3<f64>,
    pub b: Point3<f64>,
    pub c: Point3<f64>,
    pub normal: Vector3<f64>,
}

impl Facet {
    /// Triangle area
    pub fn area(&self) -> f64 {
        (self.b - self.a).cross(&(self.c - self.a)).norm() * 0.5
    }
}

/// Raw partition of one triangle against the plane, before the validity filter
#[derive(Debug, Clone)]
pub enum ClipResult {
    /// Entirely above or on the plane: passes through unmodified
    AllAbove([Point3<f64>; 3]),
    /// Entirely below: emits nothing
    AllBelow,
    /// Straddling: one or two candidate triangles along the cut
    Split(SmallVec<[[Point3<f64>; 3]; 2]>),
}

/// Counters accumulated over one mesh
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClipStats {
    /// Facets that survived the validity filter
    pub emitted: usize,
    /// Triangles entirely below the plane
    pub discarded: usize,
    /// Input triangles that straddled the plane
    pub split: usize,
    /// Candidates rejected as degenerate or non-finite
    pub degenerate_rejected: usize,
}

/// Clips triangles against a [`DatumPlane`]
#[derive(Debug, Clone, Copy)]
pub struct PlaneClipper {
    plane: DatumPlane,
}

impl PlaneClipper {
    /// Create a clipper for the given plane
    pub fn new(plane: DatumPlane) -> Self {
        Self { plane }
    }

    /// Partition one triangle against the plane.
    ///
    /// Vertices within [`SNAP_EPSILON`] of the plane are snapped onto it
    /// first, so slivers cannot arise from near-plane geometry. Candidates
    /// still have to pass [`make_facet`] before emission.
    pub fn clip_triangle(&self, corners: [Point3<f64>; 3]) -> ClipResult {
        let h = self.plane.height;
        let snapped = corners.map(|mut p| {
            if self.plane.signed_distance(&p).abs() < SNAP_EPSILON {
                p.y = h;
            }
            p
        });

        let above = snapped.map(|p| p.y >= h);
        let above_count = above.iter().filter(|&&a| a).count();

        match above_count {
            3 => ClipResult::AllAbove(snapped),
            0 => ClipResult::AllBelow,
            1 => {
                // Rotate so the above vertex leads, keeping traversal order
                let lead = above.iter().position(|&a| a).unwrap_or(0);
                let front = snapped[lead];
                let back1 = snapped[(lead + 1) % 3];
                let back2 = snapped[(lead + 2) % 3];

                let p1 = self.intersect(&front, &back1);
                let p2 = self.intersect(&front, &back2);

                let mut out = SmallVec::new();
                out.push([front, p1, p2]);
                ClipResult::Split(out)
            }
            2 => {
                // Rotate so the below vertex trails: (front1, front2, back)
                let below = above.iter().position(|&a| !a).unwrap_or(2);
                let i1 = (below + 1) % 3;
                let i2 = (below + 2) % 3;
                let front1 = snapped[i1];
                let front2 = snapped[i2];
                let back = snapped[below];

                // Clipped quad in cyclic order: front1, front2, cut points
                let quad = [
                    front1,
                    front2,
                    self.intersect(&front2, &back),
                    self.intersect(&front1, &back),
                ];

                // Fan from the first above vertex in traversal order so the
                // diagonal is reproducible across runs
                let mut out = SmallVec::new();
                if i1 < i2 {
                    out.push([quad[0], quad[1], quad[2]]);
                    out.push([quad[0], quad[2], quad[3]]);
                } else {
                    out.push([quad[1], quad[2], quad[3]]);
                    out.push([quad[1], quad[3], quad[0]]);
                }
                ClipResult::Split(out)
            }
            _ => unreachable!(),
        }
    }

    /// Intersection of the segment `a -> b` with the plane.
    ///
    /// Near-horizontal edges take the segment midpoint in x/z to avoid the
    /// division blowing up; the y coordinate is always exactly the plane's.
    fn intersect(&self, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
        let h = self.plane.height;
        let dy = b.y - a.y;
        if dy.abs() < FLAT_EDGE_EPSILON {
            return Point3::new((a.x + b.x) * 0.5, h, (a.z + b.z) * 0.5);
        }
        let t = (h - a.y) / dy;
        let p = a + (b - a) * t;
        Point3::new(p.x, h, p.z)
    }

    /// Clip a whole mesh into a facet stream.
    ///
    /// Deterministic: triangles are visited in index order and the split
    /// diagonal is fixed, so identical input gives identical output.
    pub fn clip_mesh(&self, mesh: &TriangleMesh) -> (Vec<Facet>, ClipStats) {
        let mut facets = Vec::with_capacity(mesh.triangle_count());
        let mut stats = ClipStats::default();

        for t in 0..mesh.triangle_count() {
            let (v0, v1, v2) = mesh.triangle(t);
            match self.clip_triangle([v0, v1, v2]) {
                ClipResult::AllAbove(corners) => match make_facet(corners) {
                    Some(facet) => {
                        facets.push(facet);
                        stats.emitted += 1;
                    }
                    None => stats.degenerate_rejected += 1,
                },
                ClipResult::AllBelow => stats.discarded += 1,
                ClipResult::Split(candidates) => {
                    stats.split += 1;
                    for corners in candidates {
                        match make_facet(corners) {
                            Some(facet) => {
                                facets.push(facet);
                                stats.emitted += 1;
                            }
                            None => stats.degenerate_rejected += 1,
                        }
                    }
                }
            }
        }

        (facets, stats)
    }
}

/// Validity filter: reject non-finite corners and degenerate triangles, and
/// derive the unit normal from the clipped corners (never from cached data).
pub fn make_facet(corners: [Point3<f64>; 3]) -> Option<Facet> {
    let [a, b, c] = corners;
    let finite = [a, b, c]
        .iter()
        .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite());
    if !finite {
        return None;
    }

    let cross = (b - a).cross(&(c - a));
    if cross.norm_squared() <= DEGENERATE_FACE_EPSILON {
        return None;
    }

    Some(Facet {
        a,
        b,
        c,
        normal: cross.normalize(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn clipper() -> PlaneClipper {
        PlaneClipper::new(DatumPlane::ground())
    }

    fn triangle_area(corners: &[Point3<f64>; 3]) -> f64 {
        (corners[1] - corners[0])
            .cross(&(corners[2] - corners[0]))
            .norm()
            * 0.5
    }

    #[test]
    fn test_all_above_passes_unchanged() {
        let corners = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.5, 2.0, 1.0),
        ];
        match clipper().clip_triangle(corners) {
            ClipResult::AllAbove(out) => assert_eq!(out, corners),
            other => panic!("expected AllAbove, got {other:?}"),
        }
    }

    #[test]
    fn test_all_below_discarded() {
        let corners = [
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(1.0, -2.0, 0.0),
            Point3::new(0.5, -1.5, 1.0),
        ];
        assert!(matches!(
            clipper().clip_triangle(corners),
            ClipResult::AllBelow
        ));
    }

    #[test]
    fn test_near_plane_vertices_snap() {
        let corners = [
            Point3::new(0.0, 1e-9, 0.0),
            Point3::new(1.0, -1e-9, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        // Both near-zero vertices snap onto the plane: no split happens
        match clipper().clip_triangle(corners) {
            ClipResult::AllAbove(out) => {
                assert_eq!(out[0].y, 0.0);
                assert_eq!(out[1].y, 0.0);
            }
            other => panic!("expected AllAbove after snapping, got {other:?}"),
        }
    }

    #[test]
    fn test_one_above_yields_single_triangle() {
        let corners = [
            Point3::new(0.0, 2.0, 0.0),
            Point3::new(-1.0, -2.0, 0.0),
            Point3::new(1.0, -2.0, 0.0),
        ];
        match clipper().clip_triangle(corners) {
            ClipResult::Split(out) => {
                assert_eq!(out.len(), 1);
                assert_eq!(out[0][0], corners[0]);
                assert_eq!(out[0][1].y, 0.0);
                assert_eq!(out[0][2].y, 0.0);
            }
            other => panic!("expected Split, got {other:?}"),
        }
    }

    #[test]
    fn test_two_above_fans_from_first_above_vertex() {
        let corners = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, -1.0, 0.0),
        ];
        match clipper().clip_triangle(corners) {
            ClipResult::Split(out) => {
                assert_eq!(out.len(), 2);
                // Both triangles share the first above vertex
                assert_eq!(out[0][0], corners[0]);
                assert_eq!(out[1][0], corners[0]);
            }
            other => panic!("expected Split, got {other:?}"),
        }
    }

    #[test]
    fn test_clip_conserves_area_above_plane() {
        // Triangle symmetric about the plane: half its area lies above
        let corners = [
            Point3::new(-1.0, 1.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
        ];
        let total = triangle_area(&corners);

        match clipper().clip_triangle(corners) {
            ClipResult::Split(out) => {
                let clipped: f64 = out.iter().map(triangle_area).sum();
                assert_relative_eq!(clipped, total * 0.5, epsilon = 1e-10);
            }
            other => panic!("expected Split, got {other:?}"),
        }
    }

    #[test]
    fn test_degenerate_candidate_rejected() {
        // Two coincident corners: no output facet
        let corners = [
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        assert!(make_facet(corners).is_none());
    }

    #[test]
    fn test_non_finite_rejected() {
        let corners = [
            Point3::new(f64::NAN, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        assert!(make_facet(corners).is_none());
    }

    #[test]
    fn test_facet_normal_is_unit_and_fresh() {
        let facet = make_facet([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, -1.0),
        ])
        .unwrap();
        assert_relative_eq!(facet.normal.norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(facet.normal.y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clip_mesh_counts() {
        let mut mesh = TriangleMesh::new();
        // One above, one below, one straddling
        for (v0, v1, v2) in [
            (
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 2.0, 0.0),
            ),
            (
                Point3::new(0.0, -1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
                Point3::new(0.0, -2.0, 0.0),
            ),
            (
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(2.0, 1.0, 0.0),
                Point3::new(1.0, -1.0, 0.0),
            ),
        ] {
            let base = mesh.vertex_count() as u32;
            mesh.add_vertex(v0, Vector3::z());
            mesh.add_vertex(v1, Vector3::z());
            mesh.add_vertex(v2, Vector3::z());
            mesh.add_triangle(base, base + 1, base + 2);
        }

        let (facets, stats) = clipper().clip_mesh(&mesh);
        assert_eq!(stats.discarded, 1);
        assert_eq!(stats.split, 1);
        assert_eq!(stats.emitted, 3); // 1 kept + 2 from the split
        assert_eq!(stats.degenerate_rejected, 0);
        assert_eq!(facets.len(), 3);
    }
}
