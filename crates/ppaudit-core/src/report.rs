//! Missing-cell detection over an assembled inventory.

use crate::inventory::InventoryTable;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// A (directory, year) cell with no files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingCell {
    pub label: String,
    pub component: String,
    pub year: i32,
}

/// All missing years of one directory label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingSummary {
    pub label: String,
    pub component: String,
    pub years: Vec<i32>,
}

impl fmt::Display for MissingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "files missing for {} at years {:?}", self.label, self.years)
    }
}

/// Component name of a directory label: the first `/` or whitespace token
/// once every occurrence of the marker is stripped.
///
/// `pp/ocean_monthly/ts/10yr` → `ocean_monthly`.
pub fn component_from_label(label: &str, marker: &str) -> String {
    let stripped = if marker.is_empty() {
        label.to_string()
    } else {
        label.replace(marker, "")
    };
    stripped
        .split(|c: char| c == '/' || c.is_whitespace())
        .find(|t| !t.is_empty())
        .unwrap_or(label)
        .to_string()
}

/// Missing years grouped per directory, in column order.
pub fn summarize(table: &InventoryTable) -> Vec<MissingSummary> {
    table
        .columns()
        .iter()
        .filter_map(|column| {
            let years = table.missing_years(column);
            (!years.is_empty()).then(|| MissingSummary {
                component: component_from_label(&column.label, table.marker()),
                label: column.label.clone(),
                years,
            })
        })
        .collect()
}

/// Every sentinel cell of the table. Each directory with gaps is also logged
/// as one `files missing for … at years […]` line.
pub fn report(table: &InventoryTable) -> Vec<MissingCell> {
    let mut cells = Vec::new();
    for summary in summarize(table) {
        warn!(segment = table.segment(), "{summary}");
        cells.extend(summary.years.iter().map(|year| MissingCell {
            label: summary.label.clone(),
            component: summary.component.clone(),
            year: *year,
        }));
    }
    cells
}
