// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The scene document: objects, layers and instance definitions.

use crate::error::{Error, Result};
use crate::instance::{InstanceMember, InstanceTable};
use crate::layer::{LayerId, LayerTable};
use crate::properties::PropertyMap;
use crate::renderable::Renderable;

/// Identifier of a top-level scene object, stable across the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId(pub u32);

/// One top-level object of the document
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub layer: LayerId,
    pub renderable: Renderable,
    pub properties: PropertyMap,
}

/// A complete scene: the input boundary of the export pipeline.
///
/// `unit_scale` converts document length units to meters and is applied once
/// during flattening (1.0 for documents already in meters).
#[derive(Debug, Clone)]
pub struct SceneDocument {
    objects: Vec<SceneObject>,
    pub layers: LayerTable,
    pub definitions: InstanceTable,
    pub unit_scale: f64,
    next_object_id: u32,
}

impl SceneDocument {
    /// Create an empty document in meters
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            layers: LayerTable::new(),
            definitions: InstanceTable::new(),
            unit_scale: 1.0,
            next_object_id: 0,
        }
    }

    /// Create an empty document with a unit scale (document units → meters)
    pub fn with_unit_scale(unit_scale: f64) -> Self {
        let mut doc = Self::new();
        doc.unit_scale = unit_scale;
        doc
    }

    /// Add a top-level object and return its id
    pub fn add_object(
        &mut self,
        name: impl Into<String>,
        layer: LayerId,
        renderable: Renderable,
    ) -> Result<ObjectId> {
        if self.layers.get(layer).is_none() {
            return Err(Error::UnknownLayer(layer));
        }
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;
        self.objects.push(SceneObject {
            id,
            name: name.into(),
            layer,
            renderable,
            properties: PropertyMap::new(),
        });
        Ok(id)
    }

    /// Add an instance definition and return its id
    pub fn add_definition(
        &mut self,
        name: impl Into<String>,
        members: Vec<InstanceMember>,
    ) -> crate::instance::DefinitionId {
        self.definitions.add(name, members)
    }

    /// Objects in document order
    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    /// Mutable access to an object, e.g. for attaching properties
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|o| o.id == id)
    }

    /// Check if the document has no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Default for SceneDocument {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderable::MeshData;
    use nalgebra::Point3;

    #[test]
    fn test_add_object_requires_known_layer() {
        let mut doc = SceneDocument::new();
        let mesh = Renderable::Mesh(MeshData::cuboid(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 1.0),
        ));
        let err = doc.add_object("box", LayerId(7), mesh.clone());
        assert!(err.is_err());

        let layer = doc.layers.add("Buildings", None).unwrap();
        let id = doc.add_object("box", layer, mesh).unwrap();
        assert_eq!(doc.objects().len(), 1);
        assert_eq!(doc.objects()[0].id, id);
    }
}
