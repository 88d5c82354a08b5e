use crate::support::{exit_with, print_json};
use ppaudit_core::{YearWindow, build_series};
use serde_json::json;
use std::path::{Path, PathBuf};

pub fn run(
    dir: String,
    start_year: Option<i32>,
    end_year: Option<i32>,
    extension: String,
    json_output: bool,
) {
    let dir = PathBuf::from(dir);
    let extension = extension.trim_start_matches('.').to_string();
    let accept = |path: &Path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext == extension)
    };
    let series = build_series(&dir, YearWindow::new(start_year, end_year), &accept)
        .unwrap_or_else(|e| exit_with(e));

    if json_output {
        let counts: serde_json::Map<String, serde_json::Value> = series
            .iter()
            .map(|(year, count)| (year.to_string(), json!(count)))
            .collect();
        print_json(&json!({
            "directory": dir.display().to_string(),
            "cadence": series.cadence(),
            "years": series.years().collect::<Vec<_>>(),
            "missingYears": series.missing_years(),
            "counts": counts,
        }));
        return;
    }

    println!("ppaudit series {}", dir.display());
    if let Some(cadence) = series.cadence() {
        println!("  cadence: {cadence} yr");
    }
    for (year, count) in series.iter() {
        match count {
            Some(n) => println!("  {year:>6} {n:>5}"),
            None => println!("  {year:>6}     - (expected files but none found)"),
        }
    }
}
