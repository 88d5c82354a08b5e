//! Component × year inventory for one segment length.

use crate::config::{AuditConfig, DEFAULT_PP_MARKER};
use crate::error::AuditError;
use crate::layout::PpDirectory;
use crate::metadata::directory_label;
use crate::series::{YearCountSeries, observe_directory};
use std::collections::BTreeSet;
use tracing::warn;

/// One directory's column in the inventory.
#[derive(Debug, Clone)]
pub struct InventoryColumn {
    /// Path suffix from the pp marker, e.g. `pp/ocean_monthly/ts/monthly/10yr`.
    pub label: String,
    pub series: YearCountSeries,
    /// False when the directory had too few end-years to infer a cadence;
    /// its series then holds observed counts only.
    pub verifiable: bool,
}

/// Directory label → series, outer-joined on the union of end-years.
#[derive(Debug, Clone)]
pub struct InventoryTable {
    segment: String,
    marker: String,
    years: BTreeSet<i32>,
    columns: Vec<InventoryColumn>,
}

impl InventoryTable {
    pub fn new(segment: impl Into<String>) -> Self {
        Self {
            segment: segment.into(),
            marker: DEFAULT_PP_MARKER.to_string(),
            years: BTreeSet::new(),
            columns: Vec::new(),
        }
    }

    /// Marker component the column labels start with.
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Add a column; its years join the table's year axis.
    pub fn push(&mut self, label: impl Into<String>, series: YearCountSeries, verifiable: bool) {
        self.years.extend(series.years());
        self.columns.push(InventoryColumn {
            label: label.into(),
            series,
            verifiable,
        });
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.iter().copied()
    }

    pub fn columns(&self) -> &[InventoryColumn] {
        &self.columns
    }

    pub fn column(&self, label: &str) -> Option<&InventoryColumn> {
        self.columns.iter().find(|c| c.label == label)
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Cell value: `None` is the absent sentinel, including years the column
    /// never saw.
    pub fn cell(&self, label: &str, year: i32) -> Option<usize> {
        self.column(label).and_then(|c| c.series.count(year))
    }

    /// Years of one column holding the sentinel, ascending.
    pub fn missing_years(&self, column: &InventoryColumn) -> Vec<i32> {
        self.years()
            .filter(|y| column.series.count(*y).is_none())
            .collect()
    }

    pub fn unverifiable(&self) -> impl Iterator<Item = &InventoryColumn> {
        self.columns.iter().filter(|c| !c.verifiable)
    }
}

/// Build and join the series of every directory sharing one segment label.
///
/// Directories with fewer than two end-years are kept with their observed
/// counts and marked unverifiable; any other error aborts the table.
pub fn assemble(
    segment: &str,
    directories: &[PpDirectory],
    config: &AuditConfig,
) -> Result<InventoryTable, AuditError> {
    let accept = config.file_predicate();
    let window = config.window();
    let mut table = InventoryTable::new(segment).with_marker(config.pp_marker.as_str());

    for dir in directories {
        let label = directory_label(&dir.path, &config.pp_marker)?;
        let observed = observe_directory(&dir.path, &accept)?;
        match YearCountSeries::from_observed(&dir.path, observed.clone(), window) {
            Ok(series) => table.push(label, series, true),
            Err(err @ AuditError::InsufficientSegmentEvidence { .. }) => {
                warn!(%label, "{err}; directory is unverifiable, gap synthesis skipped");
                table.push(label, YearCountSeries::observed_only(&dir.path, observed), false);
            }
            Err(err) => return Err(err),
        }
    }
    Ok(table)
}
