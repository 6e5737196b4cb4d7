// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # UrbanSTL Geometry Processing
//!
//! The geometric half of the export pipeline: instance flattening into
//! world-space nodes, tessellation of the closed renderable set (earcutr for
//! polygon triangulation, nalgebra for transforms), assembly into
//! per-(category, object) solid groups, and clipping against the ground
//! datum plane.

pub mod assemble;
pub mod clip;
pub mod error;
pub mod flatten;
pub mod mesh;
pub mod tessellate;
pub mod triangulation;

// Re-export nalgebra types for convenience
pub use nalgebra::{Matrix4, Point2, Point3, Vector2, Vector3};

pub use assemble::{assemble, AssembleOptions, RecenterMode, SolidGroup, TessellatedNode};
pub use clip::{make_facet, ClipResult, ClipStats, DatumPlane, Facet, PlaneClipper};
pub use error::{Error, Result};
pub use flatten::{flatten_document, FlattenOutcome, GeometryNode};
pub use mesh::TriangleMesh;
pub use tessellate::{BuiltinTessellator, MeshingParams, Tessellator};
pub use triangulation::{polygon_normal, triangulate_polygon, triangulate_polygon_with_holes};
