use crate::cli::{ArchiveArgs, LauncherArgs, ToolingArgs};
use crate::support::{
    build_config_or_exit, column_counts_json, exit_with, maybe_metadata, print_json,
    render_table, require_metadata_or_exit, shell_launcher, yes_no,
};
use ppaudit_core::{AuditRun, run_audit, segment_years};
use ppaudit_frepp::{FreppError, RemediationRequest};
use serde_json::{Value, json};
use tracing::{info, warn};

const CHECK_KIND: &str = "ppaudit.verify.v1";

pub struct Args {
    pub archive: ArchiveArgs,
    pub tooling: ToolingArgs,
    pub launcher: LauncherArgs,
    pub fix: bool,
    pub json: bool,
}

/// Outcome of one remediation request within a verify run.
struct Remediation {
    request: RemediationRequest,
    outcome: Option<Result<(), FreppError>>,
}

impl Remediation {
    fn status(&self) -> &'static str {
        match &self.outcome {
            None => "planned",
            Some(Ok(())) => "submitted",
            Some(Err(_)) => "rejected",
        }
    }
}

fn segments_payload(run: &AuditRun) -> Vec<Value> {
    run.segments
        .iter()
        .map(|segment| {
            let table = &segment.table;
            let columns: Vec<Value> = table
                .columns()
                .iter()
                .map(|column| {
                    json!({
                        "label": column.label,
                        "verifiable": column.verifiable,
                        "cadence": column.series.cadence(),
                        "synthesizedYears": column.series.synthesized(),
                        "counts": column_counts_json(table, &column.label),
                    })
                })
                .collect();
            json!({
                "segment": segment.segment(),
                "segmentYears": segment_years(segment.segment()),
                "years": table.years().collect::<Vec<_>>(),
                "columns": columns,
                "missing": segment.missing,
            })
        })
        .collect()
}

pub fn run(args: Args) {
    let config = build_config_or_exit(&args.archive, Some(&args.tooling));
    let audit = run_audit(&config).unwrap_or_else(|e| exit_with(e));

    // Without --fix, planning is optional and never discards the audit.
    let mut planning_error: Option<String> = None;
    let metadata = if audit.is_complete() {
        None
    } else if args.fix {
        Some(require_metadata_or_exit(
            &config.pp_root,
            config.xml_path.as_deref(),
            config.fre_version.as_deref(),
        ))
    } else {
        maybe_metadata(
            &config.pp_root,
            config.xml_path.as_deref(),
            config.fre_version.as_deref(),
        )
        .unwrap_or_else(|e| {
            warn!(error = %e, "remediation requests not planned");
            planning_error = Some(e.to_string());
            None
        })
    };

    let mut remediations: Vec<Remediation> = match &metadata {
        Some(meta) => audit
            .missing()
            .map(|cell| Remediation {
                request: RemediationRequest::for_cell(cell, meta),
                outcome: None,
            })
            .collect(),
        None => Vec::new(),
    };

    if args.fix {
        let launcher = shell_launcher(&args.launcher);
        for remediation in &mut remediations {
            let outcome = remediation.request.invoke(&launcher);
            match &outcome {
                Ok(()) => info!(
                    component = %remediation.request.component,
                    year = remediation.request.year,
                    "pp job submitted"
                ),
                Err(e) => warn!(
                    component = %remediation.request.component,
                    year = remediation.request.year,
                    error = %e,
                    "remediation rejected"
                ),
            }
            remediation.outcome = Some(outcome);
        }
    }

    let all_fixed = args.fix
        && remediations.len() == audit.missing_count()
        && remediations.iter().all(|r| matches!(r.outcome, Some(Ok(()))));
    let accepted = audit.is_complete() || all_fixed;
    let result = if audit.is_complete() {
        "complete"
    } else if all_fixed {
        "remediated"
    } else {
        "incomplete"
    };

    if args.json {
        let remediation_payload: Vec<Value> = remediations
            .iter()
            .map(|r| {
                json!({
                    "component": r.request.component,
                    "year": r.request.year,
                    "command": r.request.command,
                    "shellLine": r.request.command.to_string(),
                    "status": r.status(),
                    "error": r
                        .outcome
                        .as_ref()
                        .and_then(|o| o.as_ref().err())
                        .map(|e| e.to_string()),
                })
            })
            .collect();
        print_json(&json!({
            "schema": 1,
            "checkKind": CHECK_KIND,
            "ppRoot": config.pp_root.display().to_string(),
            "component": config.component,
            "kind": config.kind.as_str(),
            "result": result,
            "missingCount": audit.missing_count(),
            "segments": segments_payload(&audit),
            "remediation": remediation_payload,
            "remediationError": planning_error,
        }));
    } else {
        println!(
            "[ppaudit] {} ({} {} under {}, segments={}, directories={}, missing={})",
            if accepted { "OK" } else { "FAIL" },
            config.component,
            config.kind,
            config.pp_root.display(),
            audit.segments.len(),
            audit.taxonomy.directory_count(),
            audit.missing_count()
        );
        if audit.taxonomy.is_empty() {
            println!("  nothing to verify: no matching files");
        }
        for segment in &audit.segments {
            println!();
            println!("segment {}", segment.segment());
            for line in render_table(&segment.table) {
                println!("{line}");
            }
            for summary in &segment.summaries {
                println!("  {summary}");
            }
        }
        if !audit.is_complete() {
            println!();
            if let Some(e) = &planning_error {
                println!("  remediation not planned: {e}");
            } else if remediations.is_empty() {
                println!("  pass --xml and --fre-version to build remediation requests");
            }
            for r in &remediations {
                println!("  {}: {}", r.request.describe(), r.request.command);
                match &r.outcome {
                    None => {}
                    Some(Ok(())) => println!("    pp job submitted successfully"),
                    Some(Err(e)) => println!("    problem submitting: {e}"),
                }
            }
            println!("  remediated: {}", yes_no(all_fixed));
        }
    }

    if !accepted {
        std::process::exit(1);
    }
}
