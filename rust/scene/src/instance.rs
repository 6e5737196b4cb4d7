// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance definitions: shared geometry referenced by placement.

use crate::error::{Error, Result};
use crate::layer::LayerId;
use crate::properties::PropertyMap;
use crate::renderable::Renderable;
use nalgebra::Matrix4;
use rustc_hash::FxHashMap;

/// Identifier of an instance definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefinitionId(pub u32);

/// One member of an instance definition.
///
/// `layer` overrides the referencing object's layer for classification when
/// set, matching host block-member attributes. Members can themselves be
/// instance references (nested definitions).
#[derive(Debug, Clone)]
pub struct InstanceMember {
    pub renderable: Renderable,
    /// Placement of this member inside the definition's local space
    pub transform: Matrix4<f64>,
    pub layer: Option<LayerId>,
    pub properties: PropertyMap,
}

impl InstanceMember {
    /// Create a member with an identity placement and no overrides
    pub fn new(renderable: Renderable) -> Self {
        Self {
            renderable,
            transform: Matrix4::identity(),
            layer: None,
            properties: PropertyMap::new(),
        }
    }

    /// Set the member's local placement
    pub fn with_transform(mut self, transform: Matrix4<f64>) -> Self {
        self.transform = transform;
        self
    }

    /// Set the member's classification layer override
    pub fn with_layer(mut self, layer: LayerId) -> Self {
        self.layer = Some(layer);
        self
    }
}

/// A named, shared geometry definition
#[derive(Debug, Clone)]
pub struct InstanceDefinition {
    pub id: DefinitionId,
    pub name: String,
    pub members: Vec<InstanceMember>,
}

/// Table of instance definitions, resolvable by id
#[derive(Debug, Clone, Default)]
pub struct InstanceTable {
    order: Vec<DefinitionId>,
    definitions: FxHashMap<DefinitionId, InstanceDefinition>,
    next_id: u32,
}

impl InstanceTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition and return its id
    pub fn add(&mut self, name: impl Into<String>, members: Vec<InstanceMember>) -> DefinitionId {
        let id = DefinitionId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.definitions.insert(
            id,
            InstanceDefinition {
                id,
                name: name.into(),
                members,
            },
        );
        id
    }

    /// Resolve a definition by id
    pub fn get(&self, id: DefinitionId) -> Result<&InstanceDefinition> {
        self.definitions.get(&id).ok_or(Error::UnknownDefinition(id))
    }

    /// Number of definitions
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate definitions in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &InstanceDefinition> {
        self.order.iter().filter_map(|id| self.definitions.get(id))
    }
}
