// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # UrbanSTL Export
//!
//! The pipeline facade: turns a scene document into a categorized,
//! ground-clipped ASCII STL document plus per-family attribute tables.
//!
//! ```rust
//! use urbanstl_export::{Exporter, ExportOptions};
//! use urbanstl_geometry::Point3;
//! use urbanstl_scene::{MeshData, Renderable, SceneDocument};
//!
//! let mut doc = SceneDocument::new();
//! let layer = doc.layers.add("Buildings", None).unwrap();
//! doc.add_object(
//!     "box",
//!     layer,
//!     Renderable::Mesh(MeshData::cuboid(
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(10.0, 10.0, 25.0),
//!     )),
//! )
//! .unwrap();
//!
//! let outcome = Exporter::new(ExportOptions::default()).run(&doc).unwrap();
//! assert!(outcome.document.unwrap().starts_with("solid building1"));
//! ```

pub mod attributes;
pub mod command;
pub mod error;
pub mod pipeline;
pub mod stl;

pub use attributes::SideTables;
pub use command::{run_export, ExportStatus};
pub use error::{Error, Result};
pub use pipeline::{Exporter, ExportOptions, ExportOutcome, ExportReport};
pub use stl::{serialize_solids, ClippedSolid, EmittedSolid, SerializedDocument};
