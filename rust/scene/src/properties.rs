// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Key/value string properties attached to objects and layers.

use rustc_hash::FxHashMap;

/// String key/value map carried by objects, layers and instance members.
///
/// Lookups are case-sensitive; keys are stored as provided.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PropertyMap {
    entries: FxHashMap<String, String>,
}

impl PropertyMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert a key/value pair, replacing any previous value for the key
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Look up a value by key
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// First defined value among the given keys, in key order
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// Compose this map over `base`: entries from `self` win on key collision.
    pub fn merged_over(&self, base: &PropertyMap) -> PropertyMap {
        let mut entries = base.entries.clone();
        for (k, v) in &self.entries {
            entries.insert(k.clone(), v.clone());
        }
        PropertyMap { entries }
    }

    /// Iterate over entries (unordered)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = PropertyMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_object_wins() {
        let layer: PropertyMap = [("soil", "loam"), ("type", "layer-type")].into_iter().collect();
        let object: PropertyMap = [("type", "object-type")].into_iter().collect();

        let merged = object.merged_over(&layer);
        assert_eq!(merged.get("type"), Some("object-type"));
        assert_eq!(merged.get("soil"), Some("loam"));
    }

    #[test]
    fn test_first_of() {
        let map: PropertyMap = [("b", "2")].into_iter().collect();
        assert_eq!(map.first_of(&["a", "b"]), Some("2"));
        assert_eq!(map.first_of(&["a", "c"]), None);
    }
}
