//! frepp adapter for re-running post-processing of a missing cell.
//!
//! This crate is intentionally thin: it turns a (component, year,
//! experiment) triple into a frepp invocation and shells out. It does not
//! queue, retry, or time out; callers serialize requests themselves.

use ppaudit_core::{ExperimentMetadata, MissingCell};
use serde::Serialize;
use std::process::Command;
use tracing::info;

pub const DEFAULT_SHELL: &str = "sh";
pub const DEFAULT_PROGRAM: &str = "frepp";

/// Errors from launching frepp.
#[derive(Debug, thiserror::Error)]
pub enum FreppError {
    #[error("remediation rejected with exit code {code}: {command}")]
    RemediationRejected { code: i32, command: String },

    #[error("failed to launch `{shell}`: {message}")]
    Launch { shell: String, message: String },

    #[error("remediation terminated by signal: {command}")]
    Terminated { command: String },
}

impl FreppError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::RemediationRejected { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Arguments of one frepp run, fully determined by its request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationCommand {
    /// `-t YYYY0101`
    pub target_date: String,
    /// `-Y YYYY`
    pub start_year: String,
    /// `-Z YYYY`
    pub end_year: String,
    /// `-R`
    pub regenerate: bool,
    /// `-s`
    pub stop_after: bool,
    pub xml_path: String,
    pub platform: String,
    pub run_type: String,
    pub component: String,
    pub run_name: String,
    /// FRE module version loaded before running.
    pub tool_version: String,
}

impl RemediationCommand {
    /// Arguments following the program name.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["-t".to_string(), self.target_date.clone()];
        if self.regenerate {
            args.push("-R".to_string());
        }
        args.extend([
            "-Y".to_string(),
            self.start_year.clone(),
            "-Z".to_string(),
            self.end_year.clone(),
        ]);
        if self.stop_after {
            args.push("-s".to_string());
        }
        args.extend([
            "-x".to_string(),
            self.xml_path.clone(),
            "-P".to_string(),
            self.platform.clone(),
            "-T".to_string(),
            self.run_type.clone(),
            "-c".to_string(),
            self.component.clone(),
            self.run_name.clone(),
        ]);
        args
    }

    /// Shell text running `program` with these arguments, optionally after
    /// loading the FRE module.
    pub fn shell_line(&self, program: &str, load_module: bool) -> String {
        let mut words = vec![shell_quote(program)];
        words.extend(self.args().iter().map(|a| shell_quote(a)));
        let invocation = words.join(" ");
        if load_module {
            format!(
                "module load fre/{} ; {invocation}",
                shell_quote(&self.tool_version)
            )
        } else {
            invocation
        }
    }
}

impl std::fmt::Display for RemediationCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.shell_line(DEFAULT_PROGRAM, true))
    }
}

fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));
    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}

/// Runs a remediation command and reports its exit code.
pub trait Launcher {
    fn launch(&self, command: &RemediationCommand) -> Result<i32, FreppError>;
}

/// Launches frepp through `<shell> -c`, blocking until it exits.
#[derive(Debug, Clone)]
pub struct ShellLauncher {
    pub shell: String,
    pub program: String,
    pub load_module: bool,
}

impl Default for ShellLauncher {
    fn default() -> Self {
        Self {
            shell: DEFAULT_SHELL.to_string(),
            program: DEFAULT_PROGRAM.to_string(),
            load_module: true,
        }
    }
}

impl Launcher for ShellLauncher {
    fn launch(&self, command: &RemediationCommand) -> Result<i32, FreppError> {
        let line = command.shell_line(&self.program, self.load_module);
        info!(%line, "launching remediation");
        let status = Command::new(&self.shell)
            .arg("-c")
            .arg(&line)
            .status()
            .map_err(|err| FreppError::Launch {
                shell: self.shell.clone(),
                message: err.to_string(),
            })?;
        status
            .code()
            .ok_or(FreppError::Terminated { command: line })
    }
}

/// Re-run request for one missing (component, year) cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemediationRequest {
    pub component: String,
    pub year: i32,
    pub command: RemediationCommand,
}

impl RemediationRequest {
    pub fn new(component: impl Into<String>, year: i32, metadata: &ExperimentMetadata) -> Self {
        let component = component.into();
        let cyear = format!("{year:04}");
        let command = RemediationCommand {
            target_date: format!("{cyear}0101"),
            start_year: cyear.clone(),
            end_year: cyear,
            regenerate: true,
            stop_after: true,
            xml_path: metadata.xml_path.clone(),
            platform: metadata.platform.clone(),
            run_type: metadata.run_type.clone(),
            component: component.clone(),
            run_name: metadata.run_name.clone(),
            tool_version: metadata.tool_version.clone(),
        };
        Self {
            component,
            year,
            command,
        }
    }

    pub fn for_cell(cell: &MissingCell, metadata: &ExperimentMetadata) -> Self {
        Self::new(cell.component.clone(), cell.year, metadata)
    }

    /// Run the request; any non-zero exit becomes `RemediationRejected`.
    pub fn invoke(&self, launcher: &dyn Launcher) -> Result<(), FreppError> {
        match launcher.launch(&self.command)? {
            0 => Ok(()),
            code => Err(FreppError::RemediationRejected {
                code,
                command: self.command.to_string(),
            }),
        }
    }

    /// Label shown next to the request, e.g. `Fix ocean_monthly for year 2004`.
    pub fn describe(&self) -> String {
        format!("Fix {} for year {}", self.component, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn metadata() -> ExperimentMetadata {
        ExperimentMetadata {
            run_name: "OM4p25_cycle1".to_string(),
            platform: "gfdl.ncrc4-intel18".to_string(),
            run_type: "prod".to_string(),
            xml_path: "/home/jd/om4.xml".to_string(),
            tool_version: "bronx-20".to_string(),
        }
    }

    struct RecordingLauncher {
        code: i32,
        seen: RefCell<Vec<RemediationCommand>>,
    }

    impl Launcher for RecordingLauncher {
        fn launch(&self, command: &RemediationCommand) -> Result<i32, FreppError> {
            self.seen.borrow_mut().push(command.clone());
            Ok(self.code)
        }
    }

    #[test]
    fn request_pads_year_into_target_date() {
        let req = RemediationRequest::new("ocean_monthly", 1999, &metadata());
        assert_eq!(req.command.target_date, "19990101");
        assert_eq!(req.command.start_year, "1999");
        assert_eq!(req.command.end_year, "1999");
        assert!(req.command.regenerate);
        assert!(req.command.stop_after);
        assert_eq!(req.command.component, "ocean_monthly");

        let early = RemediationRequest::new("ice", 5, &metadata());
        assert_eq!(early.command.target_date, "00050101");
        assert_eq!(early.command.start_year, "0005");
    }

    #[test]
    fn command_renders_frepp_line() {
        let req = RemediationRequest::new("ocean_monthly", 1999, &metadata());
        insta::assert_snapshot!(
            req.command.to_string(),
            @"module load fre/bronx-20 ; frepp -t 19990101 -R -Y 1999 -Z 1999 -s -x /home/jd/om4.xml -P gfdl.ncrc4-intel18 -T prod -c ocean_monthly OM4p25_cycle1"
        );
    }

    #[test]
    fn shell_line_quotes_unsafe_words() {
        let mut meta = metadata();
        meta.xml_path = "/home/j d/it's.xml".to_string();
        let req = RemediationRequest::new("land", 2000, &meta);
        let line = req.command.shell_line("frepp", false);
        assert!(line.starts_with("frepp -t 20000101"));
        assert!(line.contains(r"-x '/home/j d/it'\''s.xml'"));
    }

    #[test]
    fn invoke_maps_exit_codes() {
        let req = RemediationRequest::new("atmos", 2010, &metadata());
        let ok = RecordingLauncher {
            code: 0,
            seen: RefCell::new(Vec::new()),
        };
        req.invoke(&ok).expect("exit 0 is success");
        assert_eq!(ok.seen.borrow().len(), 1);

        let rejected = RecordingLauncher {
            code: 3,
            seen: RefCell::new(Vec::new()),
        };
        let err = req.invoke(&rejected).expect_err("non-zero exit is rejected");
        assert_eq!(err.exit_code(), Some(3));
        assert!(err.to_string().contains("-c atmos"));
    }

    #[test]
    fn request_from_missing_cell() {
        let cell = MissingCell {
            label: "pp/ocean_annual/ts/annual/5yr".to_string(),
            component: "ocean_annual".to_string(),
            year: 2004,
        };
        let req = RemediationRequest::for_cell(&cell, &metadata());
        assert_eq!(req.describe(), "Fix ocean_annual for year 2004");
        assert_eq!(req.command.run_name, "OM4p25_cycle1");
    }

    #[cfg(unix)]
    #[test]
    fn shell_launcher_reports_child_exit_code() {
        let req = RemediationRequest::new("ocean", 1999, &metadata());
        let succeed = ShellLauncher {
            program: "true".to_string(),
            load_module: false,
            ..ShellLauncher::default()
        };
        req.invoke(&succeed).expect("`true` exits 0");

        let fail = ShellLauncher {
            program: "false".to_string(),
            load_module: false,
            ..ShellLauncher::default()
        };
        let err = req.invoke(&fail).expect_err("`false` exits 1");
        assert!(matches!(
            err,
            FreppError::RemediationRejected { code: 1, .. }
        ));
    }

    #[test]
    fn shell_launcher_reports_missing_shell() {
        let req = RemediationRequest::new("ocean", 1999, &metadata());
        let launcher = ShellLauncher {
            shell: "/nonexistent/ppaudit-shell".to_string(),
            ..ShellLauncher::default()
        };
        let err = req.invoke(&launcher).expect_err("shell is missing");
        assert!(matches!(err, FreppError::Launch { .. }));
    }
}
