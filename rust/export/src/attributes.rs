// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-category attribute tables emitted alongside the solid document.
//!
//! One CSV per thematic family (vegetation, road, water, building), keyed by
//! the solid name assigned during serialization so downstream tools can join
//! rows back to geometry. Each column takes the first defined value from the
//! solid's merged property map, else the literal placeholder.

use crate::stl::EmittedSolid;
use urbanstl_scene::Category;

/// Placeholder written for attributes with no defined value
const PLACEHOLDER: &str = "default";

/// UTF-8 byte-order mark expected by common spreadsheet consumers
const BOM: &str = "\u{feff}";

/// One attribute column: header name plus the property keys probed in order
struct Column {
    header: &'static str,
    keys: &'static [&'static str],
}

const VEGETATION_COLUMNS: &[Column] = &[
    Column { header: "Type", keys: &["vegetation_type", "type"] },
    Column { header: "Soil", keys: &["soil"] },
    Column { header: "Height", keys: &["height"] },
];

const ROAD_COLUMNS: &[Column] = &[
    Column { header: "Type", keys: &["road_type", "type"] },
    Column { header: "Lanes", keys: &["lanes"] },
];

const WATER_COLUMNS: &[Column] = &[
    Column { header: "Type", keys: &["water_type", "type"] },
    Column { header: "Depth", keys: &["depth"] },
];

const BUILDING_COLUMNS: &[Column] = &[
    Column { header: "Usage", keys: &["usage", "type"] },
    Column { header: "WallMaterial", keys: &["wall_material"] },
    Column { header: "RoofMaterial", keys: &["roof_material"] },
];

/// The side tables produced by one export; absent families are `None`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SideTables {
    pub vegetation: Option<String>,
    pub roads: Option<String>,
    pub waters: Option<String>,
    pub buildings: Option<String>,
}

/// Build all side tables from the emitted solids
pub fn build_tables(solids: &[EmittedSolid]) -> SideTables {
    SideTables {
        vegetation: build_table(solids, VEGETATION_COLUMNS, |c| {
            matches!(c, Category::Trees | Category::Grasses)
        }),
        roads: build_table(solids, ROAD_COLUMNS, |c| c == Category::Roads),
        waters: build_table(solids, WATER_COLUMNS, |c| c == Category::Waters),
        buildings: build_table(solids, BUILDING_COLUMNS, |c| c == Category::Buildings),
    }
}

fn build_table(
    solids: &[EmittedSolid],
    columns: &[Column],
    belongs: impl Fn(Category) -> bool,
) -> Option<String> {
    let rows: Vec<&EmittedSolid> = solids.iter().filter(|s| belongs(s.category)).collect();
    if rows.is_empty() {
        return None;
    }

    let mut out = String::from(BOM);
    out.push_str("Name");
    for column in columns {
        out.push(',');
        out.push_str(&csv_escape(column.header));
    }
    out.push('\n');

    for solid in rows {
        out.push_str(&csv_escape(&solid.name));
        for column in columns {
            let value = solid.properties.first_of(column.keys).unwrap_or(PLACEHOLDER);
            out.push(',');
            out.push_str(&csv_escape(value));
        }
        out.push('\n');
    }

    Some(out)
}

/// Quote a CSV field when it contains a comma, quote or newline
fn csv_escape(field: &str) -> String {
    if field.chars().any(|c| matches!(c, ',' | '"' | '\n' | '\r')) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
