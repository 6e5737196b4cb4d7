// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASCII STL serialization with deterministic solid naming.
//!
//! Solids are written by category in the fixed enumeration order, then by
//! source object id. Each stem carries one monotonically increasing counter
//! starting at 1; counters never reset between groups. Groups that clipped
//! down to zero facets are skipped entirely and reported, never written as
//! empty `solid`/`endsolid` pairs.

use rustc_hash::FxHashMap;
use std::fmt::Write;
use urbanstl_geometry::Facet;
use urbanstl_scene::{Category, ObjectId, PropertyMap};

/// One clipped solid group ready for serialization
#[derive(Debug)]
pub struct ClippedSolid {
    pub category: Category,
    pub source: ObjectId,
    pub facets: Vec<Facet>,
    pub properties: PropertyMap,
}

/// A solid that made it into the output document
#[derive(Debug, Clone)]
pub struct EmittedSolid {
    pub name: String,
    pub category: Category,
    pub source: ObjectId,
    pub facet_count: usize,
    pub properties: PropertyMap,
}

/// Serialization result: the document text plus per-solid bookkeeping
#[derive(Debug, Default)]
pub struct SerializedDocument {
    pub text: String,
    pub emitted: Vec<EmittedSolid>,
    /// Groups skipped because clipping left no valid facets
    pub empty_skipped: Vec<(Category, ObjectId)>,
}

/// Serialize clipped solids into one ASCII STL document.
///
/// Numbers are written with `f64`'s default formatting: the shortest text
/// that parses back to the identical value, which keeps the file round-trip
/// readable.
pub fn serialize_solids(solids: &[ClippedSolid], other_as_building: bool) -> SerializedDocument {
    let mut order: Vec<usize> = (0..solids.len()).collect();
    order.sort_by_key(|&i| (solids[i].category.index(), solids[i].source));

    let mut doc = SerializedDocument::default();
    let mut counters: FxHashMap<&'static str, usize> = FxHashMap::default();

    for i in order {
        let solid = &solids[i];
        if solid.facets.is_empty() {
            doc.empty_skipped.push((solid.category, solid.source));
            continue;
        }

        let stem = solid.category.stem(other_as_building);
        let counter = counters.entry(stem).or_insert(0);
        *counter += 1;
        let name = format!("{stem}{counter}");

        write_solid(&mut doc.text, &name, &solid.facets);
        doc.emitted.push(EmittedSolid {
            name,
            category: solid.category,
            source: solid.source,
            facet_count: solid.facets.len(),
            properties: solid.properties.clone(),
        });
    }

    doc
}

fn write_solid(out: &mut String, name: &str, facets: &[Facet]) {
    // Infallible: writing into a String cannot fail
    let _ = writeln!(out, "solid {name}");
    for facet in facets {
        let n = facet.normal;
        let _ = writeln!(out, "  facet normal {} {} {}", n.x, n.y, n.z);
        let _ = writeln!(out, "    outer loop");
        for p in [facet.a, facet.b, facet.c] {
            let _ = writeln!(out, "      vertex {} {} {}", p.x, p.y, p.z);
        }
        let _ = writeln!(out, "    endloop");
        let _ = writeln!(out, "  endfacet");
    }
    let _ = writeln!(out, "endsolid {name}");
}
