use crate::cli::{LauncherArgs, ToolingArgs};
use crate::support::{print_json, require_metadata_or_exit, shell_launcher};
use ppaudit_frepp::RemediationRequest;
use serde_json::json;
use std::path::Path;
use tracing::{info, warn};

pub struct Args {
    pub component: String,
    pub year: i32,
    pub pp_root: String,
    pub tooling: ToolingArgs,
    pub launcher: LauncherArgs,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run(args: Args) {
    let metadata = require_metadata_or_exit(
        Path::new(&args.pp_root),
        args.tooling.xml_path.as_deref(),
        args.tooling.fre_version.as_deref(),
    );
    let request = RemediationRequest::new(args.component, args.year, &metadata);

    let outcome = if args.dry_run {
        None
    } else {
        let outcome = request.invoke(&shell_launcher(&args.launcher));
        match &outcome {
            Ok(()) => info!(component = %request.component, year = request.year, "pp job submitted"),
            Err(e) => warn!(
                component = %request.component,
                year = request.year,
                error = %e,
                "remediation rejected"
            ),
        }
        Some(outcome)
    };

    if args.json {
        print_json(&json!({
            "component": request.component,
            "year": request.year,
            "command": request.command,
            "shellLine": request.command.to_string(),
            "status": match &outcome {
                None => "planned",
                Some(Ok(())) => "submitted",
                Some(Err(_)) => "rejected",
            },
            "exitCode": outcome
                .as_ref()
                .and_then(|o| o.as_ref().err())
                .and_then(|e| e.exit_code()),
        }));
    } else {
        println!("{}", request.describe());
        println!("  {}", request.command);
        match &outcome {
            None => println!("  dry run: not submitted"),
            Some(Ok(())) => println!("  pp job submitted successfully"),
            Some(Err(e)) => println!("  problem submitting: {e}"),
        }
    }

    if matches!(outcome, Some(Err(_))) {
        std::process::exit(1);
    }
}
