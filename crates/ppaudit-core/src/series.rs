//! Per-directory year series: observed file counts plus synthesized gaps.
//!
//! A directory's files only tell us which segments *do* exist. The expected
//! set is reconstructed from them:
//!
//! 1. every file contributes its `start-end` segment token,
//! 2. each distinct end-year gets the number of files carrying that end date,
//! 3. the cadence is the smallest gap between consecutive end-years,
//! 4. the range `[start, end]` is stepped by the cadence and every year with
//!    no evidence is inserted as absent (`None`).
//!
//! The minimum gap tolerates an occasional finer-grained segment living next
//! to the nominal cadence, and equals the nominal cadence when segmentation
//! is uniform.

use crate::config::YearWindow;
use crate::date::Segment;
use crate::error::AuditError;
use crate::layout::is_hidden;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Ordered end-year → file count. `None` marks an expected year with no files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCountSeries {
    directory: PathBuf,
    counts: BTreeMap<i32, Option<usize>>,
    cadence: Option<i32>,
    synthesized: Vec<i32>,
}

impl YearCountSeries {
    /// Build from observed counts, synthesizing every expected year in range.
    pub fn from_observed(
        directory: impl Into<PathBuf>,
        observed: BTreeMap<i32, usize>,
        window: YearWindow,
    ) -> Result<Self, AuditError> {
        window.validate()?;
        let directory = directory.into();
        let years: Vec<i32> = observed.keys().copied().collect();
        let cadence = infer_cadence(&years).ok_or_else(|| {
            AuditError::InsufficientSegmentEvidence {
                directory: directory.clone(),
                observed: years.len(),
            }
        })?;

        // `years` is non-empty once a cadence exists.
        let start = window.start.unwrap_or(years[0]);
        let end = window.end.unwrap_or(years[years.len() - 1]);

        let mut counts: BTreeMap<i32, Option<usize>> =
            observed.into_iter().map(|(y, n)| (y, Some(n))).collect();
        let mut synthesized = Vec::new();
        let mut year = start;
        while year <= end {
            if !counts.contains_key(&year) {
                warn!(
                    directory = %directory.display(),
                    "expected files for year {year} but none found"
                );
                counts.insert(year, None);
                synthesized.push(year);
            }
            match year.checked_add(cadence) {
                Some(next) => year = next,
                None => break,
            }
        }

        Ok(Self {
            directory,
            counts,
            cadence: Some(cadence),
            synthesized,
        })
    }

    /// Observed counts only, for directories whose cadence cannot be inferred.
    pub fn observed_only(directory: impl Into<PathBuf>, observed: BTreeMap<i32, usize>) -> Self {
        Self {
            directory: directory.into(),
            counts: observed.into_iter().map(|(y, n)| (y, Some(n))).collect(),
            cadence: None,
            synthesized: Vec::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn cadence(&self) -> Option<i32> {
        self.cadence
    }

    /// Years inserted with no evidence, ascending.
    pub fn synthesized(&self) -> &[i32] {
        &self.synthesized
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn contains(&self, year: i32) -> bool {
        self.counts.contains_key(&year)
    }

    /// Count at `year`; `None` when the year is absent or not in the series.
    pub fn count(&self, year: i32) -> Option<usize> {
        self.counts.get(&year).copied().flatten()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.counts.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, Option<usize>)> + '_ {
        self.counts.iter().map(|(y, n)| (*y, *n))
    }

    pub fn missing_years(&self) -> Vec<i32> {
        self.iter()
            .filter_map(|(y, n)| n.is_none().then_some(y))
            .collect()
    }
}

/// Smallest positive gap between distinct years; `None` with fewer than two.
pub fn infer_cadence(years: &[i32]) -> Option<i32> {
    let mut sorted = years.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    sorted.windows(2).map(|w| w[1] - w[0]).min()
}

/// Segment token of a file name: its second dot-separated field.
pub fn segment_token(file_name: &str) -> Option<&str> {
    file_name.split('.').nth(1).filter(|t| !t.is_empty())
}

/// Count files per end-year in one directory.
///
/// Files whose names carry no decodable segment token are skipped with a
/// warning.
pub fn observe_directory(
    directory: &Path,
    accept: &dyn Fn(&Path) -> bool,
) -> Result<BTreeMap<i32, usize>, AuditError> {
    let mut names = Vec::new();
    for entry in fs::read_dir(directory).map_err(|e| AuditError::io(directory, e))? {
        let entry = entry.map_err(|e| AuditError::io(directory, e))?;
        let path = entry.path();
        if is_hidden(&entry.file_name()) {
            continue;
        }
        if path.is_file() && accept(&path) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    let mut file_tokens: Vec<&str> = Vec::with_capacity(names.len());
    let mut segments: BTreeMap<&str, Segment> = BTreeMap::new();
    for name in &names {
        let Some(token) = segment_token(name) else {
            warn!(file = %name, "file name has no segment field; skipped");
            continue;
        };
        file_tokens.push(token);
        if segments.contains_key(token) {
            continue;
        }
        match Segment::parse(token) {
            Ok(segment) => {
                segments.insert(token, segment);
            }
            Err(err) => warn!(file = %name, "{err}; skipped"),
        }
    }

    let mut observed: BTreeMap<i32, usize> = BTreeMap::new();
    for segment in segments.values() {
        let end_text = segment.end_text();
        let count = file_tokens.iter().filter(|t| t.contains(end_text)).count();
        let slot = observed.entry(segment.end_year()).or_default();
        *slot = (*slot).max(count);
    }
    debug!(
        directory = %directory.display(),
        files = names.len(),
        end_years = observed.len(),
        "observed directory"
    );
    Ok(observed)
}

/// Build the full expected series for one directory.
pub fn build_series(
    directory: &Path,
    window: YearWindow,
    accept: &dyn Fn(&Path) -> bool,
) -> Result<YearCountSeries, AuditError> {
    let observed = observe_directory(directory, accept)?;
    YearCountSeries::from_observed(directory, observed, window)
}
