use crate::cli::ArchiveArgs;
use crate::support::{build_config_or_exit, exit_with, print_json};
use ppaudit_core::{resolve, segment_years};
use serde_json::{Value, json};

pub fn run(archive: ArchiveArgs, json_output: bool) {
    let config = build_config_or_exit(&archive, None);
    let accept = config.file_predicate();
    let taxonomy = resolve(&config.pp_root, &config.component, config.kind, &accept)
        .unwrap_or_else(|e| exit_with(e));

    if json_output {
        let segments: Vec<Value> = taxonomy
            .segments
            .iter()
            .map(|(segment, dirs)| {
                json!({
                    "segment": segment,
                    "segmentYears": segment_years(segment),
                    "directories": dirs,
                })
            })
            .collect();
        print_json(&json!({
            "ppRoot": config.pp_root.display().to_string(),
            "component": config.component,
            "kind": config.kind.as_str(),
            "directoryCount": taxonomy.directory_count(),
            "segments": segments,
        }));
        return;
    }

    println!(
        "ppaudit dirs {} --component {} --kind {}",
        config.pp_root.display(),
        config.component,
        config.kind
    );
    if taxonomy.is_empty() {
        println!("  (no matching files)");
    }
    for (segment, dirs) in &taxonomy.segments {
        let noun = if dirs.len() == 1 {
            "directory"
        } else {
            "directories"
        };
        println!("  {segment}: {} {noun}", dirs.len());
        for dir in dirs {
            println!("    - {}", dir.path.display());
        }
    }
}
