//! Error types for archive reconciliation.

use std::path::PathBuf;

/// Errors raised while decoding, enumerating, or reconciling a pp archive.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// A date token is not 4, 6, 8 or 10 digits, or names an impossible date.
    #[error("unsupported date format `{token}`: {reason}")]
    UnsupportedDateFormat { token: String, reason: String },

    /// Fewer than two distinct end-years, so no cadence can be inferred.
    #[error(
        "insufficient segment evidence in {}: {observed} distinct end-year(s), need at least 2",
        directory.display()
    )]
    InsufficientSegmentEvidence { directory: PathBuf, observed: usize },

    /// A start or end year override cannot be written as a 4-digit date token.
    #[error("year override {year} is outside {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },

    /// A directory path has no post-processing marker component.
    #[error("directory {} does not appear to be a valid pp directory (no `{marker}` component)", path.display())]
    NotAPpDirectory { path: PathBuf, marker: String },

    /// The pp root cannot yield experiment metadata.
    #[error("malformed pp path {}: {reason}", path.display())]
    MalformedPpPath { path: PathBuf, reason: String },

    /// Filesystem enumeration failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be read or parsed.
    #[error("invalid config at {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl AuditError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable snake_case class used in JSON payloads.
    pub fn class(&self) -> &'static str {
        match self {
            Self::UnsupportedDateFormat { .. } => "unsupported_date_format",
            Self::InsufficientSegmentEvidence { .. } => "insufficient_segment_evidence",
            Self::YearOutOfRange { .. } => "year_out_of_range",
            Self::NotAPpDirectory { .. } => "not_a_pp_directory",
            Self::MalformedPpPath { .. } => "malformed_pp_path",
            Self::Io { .. } => "io",
            Self::Config { .. } => "config",
        }
    }
}
