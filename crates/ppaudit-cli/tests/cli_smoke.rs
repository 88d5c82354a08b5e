use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Relative pp root, so path token 3 is the run name whatever the temp dir.
const PP_ROOT: &str = "archive/jdoe/bronx-20/OM4_cycle1/gfdl.ncrc4-intel18-prod/pp";

fn run_ppaudit<I, S>(cwd: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_ppaudit");
    Command::new(bin)
        .args(args)
        .current_dir(cwd)
        .env("RUST_LOG", "error")
        .output()
        .expect("ppaudit command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}):\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

fn write_segment(dir: &Path, group: &str, token: &str) {
    fs::create_dir_all(dir).expect("mkdir");
    for field in ["thetao", "so"] {
        fs::write(dir.join(format!("{group}.{token}.{field}.nc")), b"").expect("write");
    }
}

/// Archive whose ocean_monthly 5yr series lacks the 2000–2004 segment.
fn gapped_archive() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("tempdir");
    let pp = tmp.path().join(PP_ROOT);
    let monthly = pp.join("ocean_monthly/ts/monthly/5yr");
    for token in ["199001-199412", "199501-199912", "200501-200912"] {
        write_segment(&monthly, "ocean_monthly", token);
    }
    let annual = pp.join("ocean_annual/ts/annual/5yr");
    for token in ["1990-1994", "1995-1999", "2000-2004", "2005-2009"] {
        write_segment(&annual, "ocean_annual", token);
    }
    (tmp, pp)
}

#[test]
fn verify_json_reports_missing_cell_and_fails() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(tmp.path(), ["verify", PP_ROOT, "--json"]);
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["checkKind"], "ppaudit.verify.v1");
    assert_eq!(payload["result"], "incomplete");
    assert_eq!(payload["missingCount"], 1);
    let segment = &payload["segments"][0];
    assert_eq!(segment["segment"], "5yr");
    assert_eq!(segment["segmentYears"], 5);
    assert_eq!(segment["missing"][0]["component"], "ocean_monthly");
    assert_eq!(segment["missing"][0]["year"], 2004);
    let monthly = &segment["columns"][1];
    assert_eq!(monthly["label"], "pp/ocean_monthly/ts/monthly/5yr");
    assert_eq!(monthly["counts"]["2004"], Value::Null);
    assert_eq!(monthly["counts"]["1999"], 2);
    assert_eq!(
        payload["remediation"].as_array().map(Vec::len),
        Some(0),
        "no remediation without --xml/--fre-version"
    );
}

#[test]
fn verify_plans_remediation_with_tooling() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(
        tmp.path(),
        [
            "verify",
            PP_ROOT,
            "--xml",
            "/home/jdoe/om4.xml",
            "--fre-version",
            "bronx-20",
            "--json",
        ],
    );
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    let request = &payload["remediation"][0];
    assert_eq!(request["status"], "planned");
    assert_eq!(request["command"]["target_date"], "20040101");
    assert_eq!(request["command"]["start_year"], "2004");
    assert_eq!(request["command"]["end_year"], "2004");
    assert_eq!(request["command"]["run_name"], "OM4_cycle1");
    assert_eq!(request["command"]["platform"], "gfdl.ncrc4-intel18");
    assert_eq!(request["command"]["run_type"], "prod");
    assert_eq!(
        request["shellLine"],
        "module load fre/bronx-20 ; frepp -t 20040101 -R -Y 2004 -Z 2004 -s \
         -x /home/jdoe/om4.xml -P gfdl.ncrc4-intel18 -T prod -c ocean_monthly OM4_cycle1"
    );
}

#[test]
fn verify_keeps_audit_when_remediation_cannot_be_planned() {
    let tmp = TempDir::new().expect("tempdir");
    let monthly = tmp.path().join("pp/ocean_monthly/ts/monthly/5yr");
    for token in ["199001-199412", "199501-199912", "200501-200912"] {
        write_segment(&monthly, "ocean_monthly", token);
    }
    let output = run_ppaudit(
        tmp.path(),
        ["verify", "pp", "--xml", "om4.xml", "--fre-version", "bronx-20", "--json"],
    );
    assert_failure(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "incomplete");
    assert_eq!(payload["missingCount"], 1);
    assert_eq!(payload["remediation"].as_array().map(Vec::len), Some(0));
    assert!(
        payload["remediationError"]
            .as_str()
            .is_some_and(|e| e.contains("malformed pp path"))
    );
}

#[cfg(unix)]
#[test]
fn verify_fix_runs_each_request() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(
        tmp.path(),
        [
            "verify",
            PP_ROOT,
            "--xml",
            "om4.xml",
            "--fre-version",
            "bronx-20",
            "--fix",
            "--frepp",
            "true",
            "--no-module",
        ],
    );
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Fix ocean_monthly for year 2004"));
    assert!(text.contains("pp job submitted successfully"));
    assert!(text.contains("remediated: yes"));
}

#[cfg(unix)]
#[test]
fn verify_fix_reports_rejected_request() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(
        tmp.path(),
        [
            "verify",
            PP_ROOT,
            "--xml",
            "om4.xml",
            "--fre-version",
            "bronx-20",
            "--fix",
            "--frepp",
            "false",
            "--no-module",
            "--json",
        ],
    );
    assert_failure(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "incomplete");
    assert_eq!(payload["remediation"][0]["status"], "rejected");
}

#[test]
fn verify_complete_component_passes() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(tmp.path(), ["verify", PP_ROOT, "--component", "ocean_annual"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.starts_with("[ppaudit] OK"));
    assert!(text.contains("[1] pp/ocean_annual/ts/annual/5yr"));
}

#[test]
fn verify_reads_toml_config() {
    let (tmp, _pp) = gapped_archive();
    fs::write(
        tmp.path().join("ppaudit.toml"),
        format!("pp_root = \"{PP_ROOT}\"\ncomponent = \"ocean\"\nend_year = 2014\n"),
    )
    .expect("write config");
    let output = run_ppaudit(tmp.path(), ["verify", "--config", "ppaudit.toml", "--json"]);
    assert_failure(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["missingCount"], 3);
}

#[test]
fn verify_without_pp_root_errors() {
    let tmp = TempDir::new().expect("tempdir");
    let output = run_ppaudit(tmp.path(), ["verify"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("no pp root given"));
}

#[test]
fn dirs_lists_segments() {
    let (tmp, _pp) = gapped_archive();
    let output = run_ppaudit(tmp.path(), ["dirs", PP_ROOT, "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["directoryCount"], 2);
    assert_eq!(payload["segments"][0]["segment"], "5yr");
    assert_eq!(
        payload["segments"][0]["directories"][0]["component_group"],
        "ocean_annual"
    );
}

#[test]
fn series_shows_synthesized_gap() {
    let (tmp, pp) = gapped_archive();
    let dir = pp.join("ocean_monthly/ts/monthly/5yr");
    let output = run_ppaudit(tmp.path(), [OsStr::new("series"), dir.as_os_str(), OsStr::new("--json")]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["cadence"], 5);
    assert_eq!(payload["missingYears"], serde_json::json!([2004]));
    assert_eq!(payload["counts"]["2009"], 2);
}

#[test]
fn series_rejects_year_beyond_date_tokens() {
    let (tmp, pp) = gapped_archive();
    let dir = pp.join("ocean_monthly/ts/monthly/5yr");
    let output = run_ppaudit(
        tmp.path(),
        [
            OsStr::new("series"),
            dir.as_os_str(),
            OsStr::new("--end-year"),
            OsStr::new("2147483647"),
        ],
    );
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("is outside 0..=9999"));
}

#[test]
fn series_with_single_segment_is_unverifiable() {
    let tmp = TempDir::new().expect("tempdir");
    let dir = tmp.path().join("pp/ice/ts/monthly/10yr");
    write_segment(&dir, "ice", "199001-199912");
    let output = run_ppaudit(tmp.path(), [OsStr::new("series"), dir.as_os_str()]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("insufficient segment evidence"));
}

#[test]
fn metadata_splits_platform_and_run_type() {
    let tmp = TempDir::new().expect("tempdir");
    let output = run_ppaudit(
        tmp.path(),
        [
            "metadata",
            "/archive/jdoe/bronx-20/OM4_cycle1/gfdl.ncrc5-intel22-prod-openmp/pp",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["runName"], "OM4_cycle1");
    assert_eq!(payload["platform"], "gfdl.ncrc5-intel22");
    assert_eq!(payload["runType"], "prod-openmp");
}

#[test]
fn metadata_rejects_short_path() {
    let tmp = TempDir::new().expect("tempdir");
    let output = run_ppaudit(tmp.path(), ["metadata", "/archive/run1/pp"]);
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("malformed pp path"));
}

#[test]
fn fix_dry_run_prints_command() {
    let tmp = TempDir::new().expect("tempdir");
    let output = run_ppaudit(
        tmp.path(),
        [
            "fix",
            "ocean_monthly",
            "1999",
            "--pp-root",
            PP_ROOT,
            "--xml",
            "om4.xml",
            "--fre-version",
            "bronx-20",
            "--dry-run",
            "--json",
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["status"], "planned");
    assert_eq!(payload["command"]["target_date"], "19990101");
    assert_eq!(payload["command"]["start_year"], "1999");
    assert_eq!(payload["command"]["end_year"], "1999");
}

#[test]
fn fix_requires_tooling() {
    let tmp = TempDir::new().expect("tempdir");
    let output = run_ppaudit(
        tmp.path(),
        ["fix", "ocean", "1999", "--pp-root", PP_ROOT, "--dry-run"],
    );
    assert_failure(&output);
    assert!(String::from_utf8_lossy(&output.stderr).contains("--xml and --fre-version"));
}
