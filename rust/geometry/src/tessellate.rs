// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tessellation: renderables turned into triangle meshes.
//!
//! The [`Tessellator`] trait is the seam for the host's native meshing
//! capability; [`BuiltinTessellator`] covers the closed renderable set so the
//! pipeline runs self-contained. Whatever the implementation, only triangles
//! leave this stage.

use crate::error::{Error, Result};
use crate::mesh::TriangleMesh;
use crate::triangulation::{
    polygon_normal, project_to_2d, project_to_2d_with_basis, triangulate_polygon_with_holes,
};
use nalgebra::{Point2, Point3, Vector3};
use rayon::prelude::*;
use urbanstl_scene::{Brep, BrepFace, Extrusion, Face, MeshData, Renderable, SurfacePatch};

/// Meshing parameters forwarded to the tessellation capability.
///
/// The pipeline does not interpret these beyond forwarding; the built-in
/// tessellator honors the grid and edge-length controls and ignores the rest.
#[derive(Debug, Clone)]
pub struct MeshingParams {
    pub jagged_seams: bool,
    pub refine_grid: bool,
    pub simple_planes: bool,
    pub min_edge_length: f64,
    pub max_edge_length: f64,
    pub grid_min_count: u32,
    pub grid_max_count: u32,
    pub tolerance: f64,
    pub relative_tolerance: f64,
}

impl Default for MeshingParams {
    fn default() -> Self {
        Self {
            jagged_seams: false,
            refine_grid: true,
            simple_planes: false,
            min_edge_length: 0.0001,
            max_edge_length: 0.0,
            grid_min_count: 0,
            grid_max_count: 256,
            tolerance: 0.01,
            relative_tolerance: 0.0,
        }
    }
}

/// Capability that turns a renderable into triangle meshes.
///
/// Returning an empty vector means "no renderable result", not an error.
pub trait Tessellator: Send + Sync {
    fn tessellate(&self, renderable: &Renderable, params: &MeshingParams)
        -> Result<Vec<TriangleMesh>>;
}

/// Built-in tessellator for the closed renderable set
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinTessellator;

/// Brep face counts above this go through rayon
const PARALLEL_FACE_THRESHOLD: usize = 64;

impl Tessellator for BuiltinTessellator {
    fn tessellate(
        &self,
        renderable: &Renderable,
        params: &MeshingParams,
    ) -> Result<Vec<TriangleMesh>> {
        let mesh = match renderable {
            Renderable::Mesh(data) => duplicate_mesh(data),
            Renderable::Brep(brep) => tessellate_brep(brep),
            Renderable::Extrusion(extrusion) => tessellate_extrusion(extrusion)?,
            Renderable::Surface(patch) => tessellate_surface(patch, params)?,
            // Instance references are resolved by the flattener and cannot
            // occur here; an empty result is the non-error "nothing" signal.
            Renderable::Instance(_) => TriangleMesh::new(),
        };

        if mesh.is_empty() {
            Ok(Vec::new())
        } else {
            Ok(vec![mesh])
        }
    }
}

/// Duplicate a mesh payload, splitting quads and deriving per-face normals
fn duplicate_mesh(data: &MeshData) -> TriangleMesh {
    let mut mesh = TriangleMesh::with_capacity(data.faces.len() * 4, data.faces.len() * 6);
    let vertex = |i: u32| data.vertices[i as usize];
    let n = data.vertices.len() as u32;

    for face in &data.faces {
        match face {
            Face::Triangle(idx) => {
                if idx.iter().any(|&i| i >= n) {
                    continue; // malformed face, skip
                }
                add_facet(&mut mesh, vertex(idx[0]), vertex(idx[1]), vertex(idx[2]));
            }
            Face::Quad(idx) => {
                if idx.iter().any(|&i| i >= n) {
                    continue;
                }
                add_facet(&mut mesh, vertex(idx[0]), vertex(idx[1]), vertex(idx[2]));
                add_facet(&mut mesh, vertex(idx[0]), vertex(idx[2]), vertex(idx[3]));
            }
        }
    }

    mesh
}

/// Add one triangle with its face normal at every corner
fn add_facet(mesh: &mut TriangleMesh, v0: Point3<f64>, v1: Point3<f64>, v2: Point3<f64>) {
    let normal = (v1 - v0)
        .cross(&(v2 - v0))
        .try_normalize(1e-12)
        .unwrap_or_else(Vector3::z);
    let base = mesh.vertex_count() as u32;
    mesh.add_vertex(v0, normal);
    mesh.add_vertex(v1, normal);
    mesh.add_vertex(v2, normal);
    mesh.add_triangle(base, base + 1, base + 2);
}

/// Triangulate every planar face of a brep
fn tessellate_brep(brep: &Brep) -> TriangleMesh {
    let face_meshes: Vec<TriangleMesh> = if brep.faces.len() > PARALLEL_FACE_THRESHOLD {
        brep.faces.par_iter().map(triangulate_brep_face).collect()
    } else {
        brep.faces.iter().map(triangulate_brep_face).collect()
    };

    let mut mesh = TriangleMesh::new();
    for face_mesh in &face_meshes {
        mesh.merge(face_mesh);
    }
    mesh
}

fn triangulate_brep_face(face: &BrepFace) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let n = face.outer.len();
    if n < 3 {
        return mesh;
    }

    // FAST PATH: triangle or quad without holes
    if face.holes.is_empty() && n == 3 {
        add_facet(&mut mesh, face.outer[0], face.outer[1], face.outer[2]);
        return mesh;
    }
    if face.holes.is_empty() && n == 4 {
        add_facet(&mut mesh, face.outer[0], face.outer[1], face.outer[2]);
        add_facet(&mut mesh, face.outer[0], face.outer[2], face.outer[3]);
        return mesh;
    }

    // General case: project onto the face plane and earcut with holes
    let normal = polygon_normal(&face.outer);
    let (outer_2d, u_axis, v_axis, origin) = project_to_2d(&face.outer, &normal);
    let holes_2d: Vec<Vec<Point2<f64>>> = face
        .holes
        .iter()
        .map(|hole| project_to_2d_with_basis(hole, &u_axis, &v_axis, &origin))
        .collect();

    let indices = match triangulate_polygon_with_holes(&outer_2d, &holes_2d) {
        Ok(idx) => idx,
        Err(_) => return mesh, // degenerate face, contributes nothing
    };

    let mut all_points: Vec<Point3<f64>> = face.outer.clone();
    for hole in &face.holes {
        all_points.extend_from_slice(hole);
    }

    for tri in indices.chunks_exact(3) {
        add_facet(
            &mut mesh,
            all_points[tri[0]],
            all_points[tri[1]],
            all_points[tri[2]],
        );
    }
    mesh
}

/// Extrude a 2D profile along local +Z and place it
fn tessellate_extrusion(extrusion: &Extrusion) -> Result<TriangleMesh> {
    if extrusion.depth <= 0.0 {
        return Err(Error::InvalidExtrusion("Depth must be positive".to_string()));
    }
    if extrusion.profile.len() < 3 {
        return Err(Error::InvalidExtrusion(
            "Profile needs at least 3 points".to_string(),
        ));
    }

    let indices = triangulate_polygon_with_holes(&extrusion.profile, &extrusion.holes)?;
    let mut cap_points: Vec<Point2<f64>> = extrusion.profile.clone();
    for hole in &extrusion.holes {
        cap_points.extend_from_slice(hole);
    }

    let side_vertices = (extrusion.profile.len()
        + extrusion.holes.iter().map(Vec::len).sum::<usize>())
        * 4;
    let mut mesh =
        TriangleMesh::with_capacity(cap_points.len() * 2 + side_vertices, indices.len() * 2);

    create_cap(&cap_points, &indices, 0.0, -Vector3::z(), &mut mesh);
    create_cap(&cap_points, &indices, extrusion.depth, Vector3::z(), &mut mesh);

    create_side_walls(&extrusion.profile, extrusion.depth, false, &mut mesh);
    for hole in &extrusion.holes {
        create_side_walls(hole, extrusion.depth, true, &mut mesh);
    }

    mesh.transform(&extrusion.transform);
    Ok(mesh)
}

/// Create a cap (top or bottom) from the profile triangulation
fn create_cap(
    points: &[Point2<f64>],
    indices: &[usize],
    z: f64,
    normal: Vector3<f64>,
    mesh: &mut TriangleMesh,
) {
    let base = mesh.vertex_count() as u32;
    for point in points {
        mesh.add_vertex(Point3::new(point.x, point.y, z), normal);
    }
    for tri in indices.chunks_exact(3) {
        let (i0, i1, i2) = (
            base + tri[0] as u32,
            base + tri[1] as u32,
            base + tri[2] as u32,
        );
        // Bottom cap winds reversed so both caps face outward
        if normal.z < 0.0 {
            mesh.add_triangle(i0, i2, i1);
        } else {
            mesh.add_triangle(i0, i1, i2);
        }
    }
}

/// Create side walls for a profile or hole boundary
fn create_side_walls(boundary: &[Point2<f64>], depth: f64, inward: bool, mesh: &mut TriangleMesh) {
    for i in 0..boundary.len() {
        let j = (i + 1) % boundary.len();
        let p0 = &boundary[i];
        let p1 = &boundary[j];

        let edge = Vector3::new(p1.x - p0.x, p1.y - p0.y, 0.0);
        let outward_normal = Vector3::new(-edge.y, edge.x, 0.0);
        let normal = match outward_normal.try_normalize(1e-10) {
            Some(n) if !inward => n,
            Some(n) => -n,
            None => continue, // duplicate consecutive points
        };

        let idx = mesh.vertex_count() as u32;
        mesh.add_vertex(Point3::new(p0.x, p0.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, 0.0), normal);
        mesh.add_vertex(Point3::new(p1.x, p1.y, depth), normal);
        mesh.add_vertex(Point3::new(p0.x, p0.y, depth), normal);

        if inward {
            mesh.add_triangle(idx, idx + 2, idx + 1);
            mesh.add_triangle(idx, idx + 3, idx + 2);
        } else {
            mesh.add_triangle(idx, idx + 1, idx + 2);
            mesh.add_triangle(idx, idx + 2, idx + 3);
        }
    }
}

/// Sample a bilinear patch on a grid sized from the meshing parameters
fn tessellate_surface(patch: &SurfacePatch, params: &MeshingParams) -> Result<TriangleMesh> {
    if patch.cols < 2 || patch.rows < 2 || patch.control.len() != patch.cols * patch.rows {
        return Err(Error::InvalidSurface(format!(
            "control grid {}x{} does not match {} points",
            patch.cols,
            patch.rows,
            patch.control.len()
        )));
    }

    let (nu, nv) = grid_resolution(patch, params);

    let mut mesh = TriangleMesh::with_capacity((nu + 1) * (nv + 1), nu * nv * 6);
    for vi in 0..=nv {
        for ui in 0..=nu {
            let u = ui as f64 / nu as f64;
            let v = vi as f64 / nv as f64;
            // Normal from central differences of the patch evaluation
            let du = patch.point_at((u + 1e-4).min(1.0), v) - patch.point_at((u - 1e-4).max(0.0), v);
            let dv = patch.point_at(u, (v + 1e-4).min(1.0)) - patch.point_at(u, (v - 1e-4).max(0.0));
            let normal = du.cross(&dv).try_normalize(1e-14).unwrap_or_else(Vector3::z);
            mesh.add_vertex(patch.point_at(u, v), normal);
        }
    }

    let stride = (nu + 1) as u32;
    for vi in 0..nv as u32 {
        for ui in 0..nu as u32 {
            let i0 = vi * stride + ui;
            let i1 = i0 + 1;
            let i2 = i0 + stride + 1;
            let i3 = i0 + stride;
            mesh.add_triangle(i0, i1, i2);
            mesh.add_triangle(i0, i2, i3);
        }
    }

    Ok(mesh)
}

/// Pick the sampling grid: at least one quad per control cell, refined to the
/// edge-length target when requested, clamped to the configured maximum.
fn grid_resolution(patch: &SurfacePatch, params: &MeshingParams) -> (usize, usize) {
    let mut nu = (patch.cols - 1).max(params.grid_min_count as usize).max(1);
    let mut nv = (patch.rows - 1).max(params.grid_min_count as usize).max(1);

    if params.refine_grid && params.max_edge_length > 0.0 {
        let (extent_u, extent_v) = control_extents(patch);
        nu = nu.max((extent_u / params.max_edge_length).ceil() as usize);
        nv = nv.max((extent_v / params.max_edge_length).ceil() as usize);
    }

    let cap = (params.grid_max_count as usize).max(1);
    (nu.min(cap), nv.min(cap))
}

/// Longest chord across the control rows and columns
fn control_extents(patch: &SurfacePatch) -> (f64, f64) {
    let mut extent_u = 0.0f64;
    for r in 0..patch.rows {
        let mut len = 0.0;
        for c in 1..patch.cols {
            let a = patch.control[r * patch.cols + c - 1];
            let b = patch.control[r * patch.cols + c];
            len += (b - a).norm();
        }
        extent_u = extent_u.max(len);
    }

    let mut extent_v = 0.0f64;
    for c in 0..patch.cols {
        let mut len = 0.0;
        for r in 1..patch.rows {
            let a = patch.control[(r - 1) * patch.cols + c];
            let b = patch.control[r * patch.cols + c];
            len += (b - a).norm();
        }
        extent_v = extent_v.max(len);
    }

    (extent_u, extent_v)
}
