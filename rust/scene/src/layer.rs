// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Layer table with parent-link traversal and full-path naming.

use crate::error::{Error, Result};
use crate::properties::PropertyMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Identifier of a layer in the document's layer table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayerId(pub u32);

/// One layer of the nested layer tree
#[derive(Debug, Clone)]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub parent: Option<LayerId>,
    pub properties: PropertyMap,
}

/// Layer table supporting parent-link traversal.
///
/// Layers are kept in insertion order for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct LayerTable {
    order: Vec<LayerId>,
    layers: FxHashMap<LayerId, Layer>,
    next_id: u32,
}

/// Ancestor chains deeper than this are treated as malformed (cyclic parent
/// links) and truncated.
const MAX_LAYER_DEPTH: usize = 100;

impl LayerTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer under `parent` (or at the root) and return its id
    pub fn add(&mut self, name: impl Into<String>, parent: Option<LayerId>) -> Result<LayerId> {
        if let Some(p) = parent {
            if !self.layers.contains_key(&p) {
                return Err(Error::UnknownLayer(p));
            }
        }
        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.order.push(id);
        self.layers.insert(
            id,
            Layer {
                id,
                name: name.into(),
                parent,
                properties: PropertyMap::new(),
            },
        );
        Ok(id)
    }

    /// Look up a layer
    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    /// Mutable access, e.g. for attaching properties or renaming
    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    /// Parent of a layer, if any
    pub fn parent_of(&self, id: LayerId) -> Option<LayerId> {
        self.layers.get(&id).and_then(|l| l.parent)
    }

    /// Ancestor chain starting at `id` itself, walking toward the root.
    ///
    /// Truncated at [`MAX_LAYER_DEPTH`] so malformed parent links cannot loop.
    pub fn chain(&self, id: LayerId) -> SmallVec<[LayerId; 8]> {
        let mut out = SmallVec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            if out.len() >= MAX_LAYER_DEPTH || !self.layers.contains_key(&c) {
                break;
            }
            out.push(c);
            current = self.parent_of(c);
        }
        out
    }

    /// Full path name, root-first, separated by `::`
    pub fn full_path(&self, id: LayerId) -> String {
        let chain = self.chain(id);
        let mut names: Vec<&str> = chain
            .iter()
            .filter_map(|l| self.get(*l).map(|layer| layer.name.as_str()))
            .collect();
        names.reverse();
        names.join("::")
    }

    /// Number of layers
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate layers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }
}
