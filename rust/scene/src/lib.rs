// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # UrbanSTL Scene Model
//!
//! In-memory scene document consumed by the export pipeline:
//!
//! - **Document**: object list, nested layer table, instance-definition table
//! - **Renderables**: the closed geometry set (mesh, brep, extrusion, surface,
//!   instance reference)
//! - **Classification**: layer-ancestry driven category resolution against the
//!   fixed urban vocabulary (`buildings`, `trees`, `grasses`, `waters`,
//!   `grounds`, `roads`)
//!
//! The crate holds no geometry algorithms; flattening, tessellation and
//! clipping live in `urbanstl-geometry`.

pub mod category;
pub mod document;
pub mod error;
pub mod instance;
pub mod layer;
pub mod properties;
pub mod renderable;

pub use category::{Category, ClassificationMode, LayerCategoryMap};
pub use document::{ObjectId, SceneDocument, SceneObject};
pub use error::{Error, Result};
pub use instance::{DefinitionId, InstanceDefinition, InstanceMember, InstanceTable};
pub use layer::{Layer, LayerId, LayerTable};
pub use properties::PropertyMap;
pub use renderable::{Brep, BrepFace, Extrusion, Face, InstanceRef, MeshData, Renderable, SurfacePatch};
