//! Directory taxonomy of a pp archive.
//!
//! ```text
//! <pp_root>/<component>*/ts/**/<segment>/*.nc          e.g. ocean_monthly/ts/monthly/10yr
//! <pp_root>/<component>*/av/**/<...>_<segment>/*.nc    e.g. ocean_annual/av/annual_5yr
//! ```
//!
//! Resolution walks only the component and kind subtrees the caller asked
//! for, collects directories that hold at least one accepted file, and groups
//! them by segment label. Symlinks are followed; hidden entries are skipped.

use crate::config::OutputKind;
use crate::error::AuditError;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// One directory of per-segment output files.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PpDirectory {
    pub path: PathBuf,
    /// Top-level component directory, e.g. `ocean_monthly`.
    pub component_group: String,
    pub kind: OutputKind,
    /// Segment label, e.g. `10yr`.
    pub segment: String,
}

/// Directories grouped by segment label.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Taxonomy {
    pub segments: BTreeMap<String, Vec<PpDirectory>>,
}

impl Taxonomy {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segment_labels(&self) -> impl Iterator<Item = &str> {
        self.segments.keys().map(String::as_str)
    }

    pub fn directories(&self, segment: &str) -> &[PpDirectory] {
        self.segments.get(segment).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn directory_count(&self) -> usize {
        self.segments.values().map(Vec::len).sum()
    }
}

/// Segment label of a directory holding output files.
///
/// Time series use the directory's own name; averages use the last
/// underscore-separated token of it (`annual_10yr` → `10yr`).
pub fn segment_label(dir: &Path, kind: OutputKind) -> Option<String> {
    let name = dir.file_name()?.to_str()?;
    let label = match kind {
        OutputKind::Ts => name,
        OutputKind::Av => name.rsplit('_').next()?,
    };
    (!label.is_empty()).then(|| label.to_string())
}

fn segment_years_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^([0-9]+)yr$").expect("segment length regex is valid"))
}

/// Number of years in a segment label such as `10yr`.
pub fn segment_years(label: &str) -> Option<u32> {
    segment_years_re()
        .captures(label)
        .and_then(|caps| caps[1].parse().ok())
}

/// Dot-prefixed names (editor and transfer temporaries) are never output.
pub(crate) fn is_hidden(name: &OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Discover segment directories for one component filter and output kind.
///
/// A missing pp root or no matching files yields an empty taxonomy.
pub fn resolve(
    pp_root: &Path,
    component: &str,
    kind: OutputKind,
    accept: &dyn Fn(&Path) -> bool,
) -> Result<Taxonomy, AuditError> {
    if !pp_root.is_dir() {
        warn!(pp_root = %pp_root.display(), "pp root is not a directory; nothing to verify");
        return Ok(Taxonomy::default());
    }

    let mut groups = Vec::new();
    for entry in fs::read_dir(pp_root).map_err(|e| AuditError::io(pp_root, e))? {
        let entry = entry.map_err(|e| AuditError::io(pp_root, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with(component) && entry.path().is_dir() {
            groups.push(name);
        }
    }
    groups.sort();

    let mut directories: BTreeSet<PpDirectory> = BTreeSet::new();
    for group in groups {
        let kind_dir = pp_root.join(&group).join(kind.as_str());
        if !kind_dir.is_dir() {
            debug!(dir = %kind_dir.display(), "component has no output of this kind");
            continue;
        }
        let walker = WalkDir::new(&kind_dir)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.loop_ancestor().is_some() => {
                    warn!(error = %e, "symlink loop under pp root; skipped");
                    continue;
                }
                Err(e) => {
                    let path = e.path().unwrap_or(&kind_dir).to_path_buf();
                    return Err(AuditError::io(path, std::io::Error::other(e.to_string())));
                }
            };
            if !entry.file_type().is_file() || !accept(entry.path()) {
                continue;
            }
            let Some(dir) = entry.path().parent() else {
                continue;
            };
            let Some(segment) = segment_label(dir, kind) else {
                continue;
            };
            directories.insert(PpDirectory {
                path: dir.to_path_buf(),
                component_group: group.clone(),
                kind,
                segment,
            });
        }
    }

    let mut taxonomy = Taxonomy::default();
    for dir in directories {
        taxonomy
            .segments
            .entry(dir.segment.clone())
            .or_default()
            .push(dir);
    }
    debug!(
        segments = taxonomy.segments.len(),
        directories = taxonomy.directory_count(),
        "resolved pp taxonomy"
    );
    Ok(taxonomy)
}
