use crate::cli::{ArchiveArgs, LauncherArgs, ToolingArgs};
use ppaudit_core::{
    AuditConfig, AuditError, ExperimentMetadata, InventoryTable, OutputKind, infer_metadata,
};
use ppaudit_frepp::ShellLauncher;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Logs go to stderr so `--json` output stays parseable.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

pub fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}

pub fn parse_kind_or_exit(kind: &str) -> OutputKind {
    kind.parse().unwrap_or_else(|e: String| exit_with(e))
}

/// Config file (if any) overridden by command-line flags.
pub fn build_config_or_exit(archive: &ArchiveArgs, tooling: Option<&ToolingArgs>) -> AuditConfig {
    let mut config = match &archive.config {
        Some(path) => AuditConfig::load(path).unwrap_or_else(|e| exit_with(e)),
        None => AuditConfig::default(),
    };

    if let Some(pp_root) = &archive.pp_root {
        config.pp_root = PathBuf::from(pp_root);
    }
    if let Some(component) = &archive.component {
        config.component = component.clone();
    }
    if let Some(kind) = &archive.kind {
        config.kind = parse_kind_or_exit(kind);
    }
    if archive.start_year.is_some() {
        config.start_year = archive.start_year;
    }
    if archive.end_year.is_some() {
        config.end_year = archive.end_year;
    }
    if let Some(extension) = &archive.extension {
        config.extension = extension.trim_start_matches('.').to_string();
    }
    if let Some(marker) = &archive.pp_marker {
        config.pp_marker = marker.clone();
    }
    if let Some(tooling) = tooling {
        if tooling.xml_path.is_some() {
            config.xml_path = tooling.xml_path.clone();
        }
        if tooling.fre_version.is_some() {
            config.fre_version = tooling.fre_version.clone();
        }
    }

    if config.pp_root.as_os_str().is_empty() {
        exit_with("no pp root given; pass PP_ROOT or set `pp_root` in --config");
    }
    config
}

/// Metadata for remediation, or `None` when the XML path or FRE version is
/// unknown.
pub fn maybe_metadata(
    pp_root: &Path,
    xml_path: Option<&str>,
    fre_version: Option<&str>,
) -> Result<Option<ExperimentMetadata>, AuditError> {
    let (Some(xml_path), Some(fre_version)) = (xml_path, fre_version) else {
        return Ok(None);
    };
    infer_metadata(pp_root, xml_path, fre_version).map(Some)
}

pub fn require_metadata_or_exit(
    pp_root: &Path,
    xml_path: Option<&str>,
    fre_version: Option<&str>,
) -> ExperimentMetadata {
    maybe_metadata(pp_root, xml_path, fre_version)
        .unwrap_or_else(|e| exit_with(e))
        .unwrap_or_else(|| {
            exit_with(
                "remediation needs both --xml and --fre-version (or xml_path/fre_version in --config)",
            )
        })
}

pub fn shell_launcher(args: &LauncherArgs) -> ShellLauncher {
    ShellLauncher {
        shell: args.shell.clone(),
        program: args.frepp.clone(),
        load_module: !args.no_module,
    }
}

pub fn print_json(payload: &Value) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: failed to render payload: {e}");
        std::process::exit(2);
    });
    println!("{rendered}");
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}

/// `{ "1990": 3, "1995": null, ... }` for one column.
pub fn column_counts_json(table: &InventoryTable, label: &str) -> Value {
    let counts: serde_json::Map<String, Value> = table
        .years()
        .map(|year| (year.to_string(), json!(table.cell(label, year))))
        .collect();
    Value::Object(counts)
}

/// Year × directory grid; `-` marks a year with no files.
pub fn render_table(table: &InventoryTable) -> Vec<String> {
    let mut lines = Vec::new();
    for (idx, column) in table.columns().iter().enumerate() {
        let note = if column.verifiable {
            ""
        } else {
            " (unverifiable: fewer than two end-years)"
        };
        lines.push(format!("  [{}] {}{note}", idx + 1, column.label));
    }

    let mut header = format!("  {:>6}", "year");
    for idx in 0..table.columns().len() {
        header.push_str(&format!(" {:>5}", format!("[{}]", idx + 1)));
    }
    lines.push(header);

    for year in table.years() {
        let mut row = format!("  {year:>6}");
        for column in table.columns() {
            let cell = match column.series.count(year) {
                Some(n) => n.to_string(),
                None => "-".to_string(),
            };
            row.push_str(&format!(" {cell:>5}"));
        }
        lines.push(row);
    }
    lines
}
