// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Semantic categories and layer-ancestry classification.
//!
//! A layer belongs to a category when its own trimmed, case-folded name — or
//! any ancestor's — matches one of the six category keywords. The first match
//! walking from the layer upward wins; everything else is `Other`.

use crate::layer::{LayerId, LayerTable};
use rustc_hash::FxHashMap;

/// Fixed semantic vocabulary of exported solids.
///
/// The variant order is the serialization order and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Category {
    Buildings,
    Trees,
    Grasses,
    Waters,
    Grounds,
    Roads,
    /// Fallback for objects with no category ancestor
    Other,
}

impl Category {
    /// All categories in serialization order
    pub const ALL: [Category; 7] = [
        Category::Buildings,
        Category::Trees,
        Category::Grasses,
        Category::Waters,
        Category::Grounds,
        Category::Roads,
        Category::Other,
    ];

    /// Layer-name keyword for this category (`Other` has none)
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            Category::Buildings => Some("buildings"),
            Category::Trees => Some("trees"),
            Category::Grasses => Some("grasses"),
            Category::Waters => Some("waters"),
            Category::Grounds => Some("grounds"),
            Category::Roads => Some("roads"),
            Category::Other => None,
        }
    }

    /// Match a layer name against the category keywords.
    ///
    /// Names are trimmed and compared case-insensitively.
    pub fn from_layer_name(name: &str) -> Option<Category> {
        let trimmed = name.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.keyword().is_some_and(|k| trimmed.eq_ignore_ascii_case(k)))
    }

    /// Output-name stem for this category.
    ///
    /// `roads` maps to `highway` — an irregular mapping fixed by the output
    /// consumer's vocabulary, not a typo to regularize. `other_as_building`
    /// folds the fallback bucket into the building stem.
    pub fn stem(self, other_as_building: bool) -> &'static str {
        match self {
            Category::Buildings => "building",
            Category::Trees => "tree",
            Category::Grasses => "grass",
            Category::Waters => "waterway",
            Category::Grounds => "ground",
            Category::Roads => "highway",
            Category::Other => {
                if other_as_building {
                    "building"
                } else {
                    "other"
                }
            }
        }
    }

    /// Position in the serialization order
    pub fn index(self) -> usize {
        Category::ALL.iter().position(|c| *c == self).unwrap_or(Category::ALL.len() - 1)
    }

    /// Ground-hugging categories whose faces must end up facing upward
    pub fn needs_upward_winding(self) -> bool {
        matches!(
            self,
            Category::Grasses | Category::Waters | Category::Grounds | Category::Roads
        )
    }
}

/// Which objects the export keeps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationMode {
    /// Every object is exported; unclassified ones land in `Other`
    #[default]
    All,
    /// Only objects under a `Buildings` ancestor are exported
    BuildingsOnly,
}

/// Layer-id to category lookup, built once per document
#[derive(Debug, Clone, Default)]
pub struct LayerCategoryMap {
    entries: FxHashMap<LayerId, Category>,
}

impl LayerCategoryMap {
    /// Build the map: for every layer, the first self-or-ancestor whose name
    /// matches a keyword assigns that category to the layer's own id.
    pub fn build(layers: &LayerTable) -> Self {
        let mut entries = FxHashMap::default();
        for layer in layers.iter() {
            for ancestor in layers.chain(layer.id) {
                let Some(a) = layers.get(ancestor) else { break };
                if let Some(category) = Category::from_layer_name(&a.name) {
                    entries.insert(layer.id, category);
                    break;
                }
            }
        }
        Self { entries }
    }

    /// Direct lookup for a single layer id
    pub fn get(&self, layer: LayerId) -> Option<Category> {
        self.entries.get(&layer).copied()
    }

    /// Classify a layer by re-walking its ancestor chain against the map.
    ///
    /// The re-walk makes classification agree with build-time results even
    /// when the map only carries entries for part of a chain.
    pub fn classify(&self, layer: LayerId, layers: &LayerTable) -> Category {
        for ancestor in layers.chain(layer) {
            if let Some(category) = self.get(ancestor) {
                return category;
            }
        }
        Category::Other
    }
}
