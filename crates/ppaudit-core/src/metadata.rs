//! Experiment identity derived from the pp root path.
//!
//! Archive roots follow a fixed layout, counted over non-empty path tokens:
//!
//! ```text
//! /archive/<user>/<fre-version>/<run-name>/<platform>-<run-type>/pp
//!  0        1      2             3          4
//! ```
//!
//! The platform itself contains one hyphen (`gfdl.ncrc4-intel18`), so token 4
//! is split at its *second* hyphen.

use crate::error::AuditError;
use serde::Serialize;
use std::path::{Component, Path, PathBuf};

pub const RUN_NAME_TOKEN: usize = 3;
pub const PLATFORM_RUN_TYPE_TOKEN: usize = 4;

/// Normal path components of a path, with indexed access that fails instead
/// of panicking.
#[derive(Debug, Clone)]
pub struct PathTokens<'a> {
    path: &'a Path,
    tokens: Vec<String>,
}

impl<'a> PathTokens<'a> {
    pub fn new(path: &'a Path) -> Self {
        let tokens = path
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();
        Self { path, tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token at `index`, or `MalformedPpPath` naming what was expected there.
    pub fn get(&self, index: usize, role: &str) -> Result<&str, AuditError> {
        self.tokens
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| AuditError::MalformedPpPath {
                path: self.path.to_path_buf(),
                reason: format!(
                    "expected {role} at path component {index}, found only {} components",
                    self.tokens.len()
                ),
            })
    }

    /// Index of the last token equal to `marker`.
    pub fn rposition(&self, marker: &str) -> Option<usize> {
        self.tokens.iter().rposition(|t| t == marker)
    }

    pub fn suffix_from(&self, index: usize) -> String {
        self.tokens[index.min(self.tokens.len())..].join("/")
    }
}

/// Run identity recovered from the pp root alone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunIdentity {
    pub run_name: String,
    pub platform: String,
    pub run_type: String,
}

impl RunIdentity {
    pub fn infer(pp_root: impl AsRef<Path>) -> Result<Self, AuditError> {
        let pp_root = pp_root.as_ref();
        let tokens = PathTokens::new(pp_root);
        let run_name = tokens.get(RUN_NAME_TOKEN, "run name")?;
        let platform_run_type = tokens.get(PLATFORM_RUN_TYPE_TOKEN, "platform-runType")?;

        let cut = platform_run_type
            .match_indices('-')
            .nth(1)
            .map(|(idx, _)| idx)
            .ok_or_else(|| AuditError::MalformedPpPath {
                path: pp_root.to_path_buf(),
                reason: format!(
                    "`{platform_run_type}` has no second hyphen separating platform and run type"
                ),
            })?;

        Ok(Self {
            run_name: run_name.to_string(),
            platform: platform_run_type[..cut].to_string(),
            run_type: platform_run_type[cut + 1..].to_string(),
        })
    }

    pub fn with_tooling(
        self,
        xml_path: impl Into<String>,
        tool_version: impl Into<String>,
    ) -> ExperimentMetadata {
        ExperimentMetadata {
            run_name: self.run_name,
            platform: self.platform,
            run_type: self.run_type,
            xml_path: xml_path.into(),
            tool_version: tool_version.into(),
        }
    }
}

/// Immutable parameters of one experiment, needed to request remediation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExperimentMetadata {
    pub run_name: String,
    pub platform: String,
    pub run_type: String,
    pub xml_path: String,
    pub tool_version: String,
}

/// Derive experiment metadata from the pp root plus caller-supplied tooling.
pub fn infer_metadata(
    pp_root: impl AsRef<Path>,
    xml_path: impl Into<String>,
    tool_version: impl Into<String>,
) -> Result<ExperimentMetadata, AuditError> {
    Ok(RunIdentity::infer(pp_root)?.with_tooling(xml_path, tool_version))
}

/// Directory label: the path suffix starting at the pp marker component.
pub fn directory_label(path: &Path, marker: &str) -> Result<String, AuditError> {
    let tokens = PathTokens::new(path);
    let start = tokens
        .rposition(marker)
        .ok_or_else(|| AuditError::NotAPpDirectory {
            path: PathBuf::from(path),
            marker: marker.to_string(),
        })?;
    Ok(tokens.suffix_from(start))
}
