use crate::cli::ToolingArgs;
use crate::support::{exit_with, print_json};
use ppaudit_core::RunIdentity;
use serde_json::json;

pub fn run(pp_root: String, tooling: ToolingArgs, json_output: bool) {
    let identity = RunIdentity::infer(&pp_root).unwrap_or_else(|e| exit_with(e));

    if json_output {
        print_json(&json!({
            "ppRoot": pp_root,
            "runName": identity.run_name,
            "platform": identity.platform,
            "runType": identity.run_type,
            "xmlPath": tooling.xml_path,
            "toolVersion": tooling.fre_version,
        }));
        return;
    }

    println!("ppaudit metadata {pp_root}");
    println!("  run name: {}", identity.run_name);
    println!("  platform: {}", identity.platform);
    println!("  run type: {}", identity.run_type);
    if let Some(xml) = &tooling.xml_path {
        println!("  xml: {xml}");
    }
    if let Some(version) = &tooling.fre_version {
        println!("  fre version: {version}");
    }
}
