//! Explicit audit configuration.
//!
//! Every stage takes what it needs from an `AuditConfig` passed by the
//! caller. A config can be loaded from TOML and then overridden field by
//! field from the command line.

use crate::date::{MAX_YEAR, MIN_YEAR};
use crate::error::AuditError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const DEFAULT_COMPONENT: &str = "ocean";
pub const DEFAULT_EXTENSION: &str = "nc";
pub const DEFAULT_PP_MARKER: &str = "pp";

/// Output kind directory under a component: time series or averages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    #[default]
    Ts,
    Av,
}

impl OutputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ts => "ts",
            Self::Av => "av",
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ts" => Ok(Self::Ts),
            "av" => Ok(Self::Av),
            other => Err(format!("unknown output kind `{other}` (expected ts or av)")),
        }
    }
}

/// Caller-supplied bounds on the expected end-year range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearWindow {
    pub start: Option<i32>,
    pub end: Option<i32>,
}

impl YearWindow {
    pub fn new(start: Option<i32>, end: Option<i32>) -> Self {
        Self { start, end }
    }

    /// Both bounds must fit a 4-digit year token.
    pub fn validate(&self) -> Result<(), AuditError> {
        for year in [self.start, self.end].into_iter().flatten() {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(AuditError::YearOutOfRange {
                    year,
                    min: MIN_YEAR,
                    max: MAX_YEAR,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AuditConfig {
    /// Post-processing root, e.g. `/archive/<user>/<fre>/<run>/<platform-target>/pp`.
    pub pp_root: PathBuf,
    /// Component directory prefix (`ocean` matches `ocean_monthly`, `ocean_annual`, …).
    pub component: String,
    pub kind: OutputKind,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    /// Extension of per-segment output files, without the dot.
    pub extension: String,
    /// Path component that starts directory labels.
    pub pp_marker: String,
    pub xml_path: Option<String>,
    pub fre_version: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            pp_root: PathBuf::new(),
            component: DEFAULT_COMPONENT.to_string(),
            kind: OutputKind::Ts,
            start_year: None,
            end_year: None,
            extension: DEFAULT_EXTENSION.to_string(),
            pp_marker: DEFAULT_PP_MARKER.to_string(),
            xml_path: None,
            fre_version: None,
        }
    }
}

impl AuditConfig {
    pub fn new(pp_root: impl Into<PathBuf>) -> Self {
        Self {
            pp_root: pp_root.into(),
            ..Self::default()
        }
    }

    /// Load a TOML config file. Missing keys take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        Self::from_toml_str(&text).map_err(|source| AuditError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn window(&self) -> YearWindow {
        YearWindow::new(self.start_year, self.end_year)
    }

    /// Predicate accepting files with the configured extension.
    pub fn file_predicate(&self) -> impl Fn(&Path) -> bool + '_ {
        move |path: &Path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == self.extension)
        }
    }
}
