// src/utils/report.rs

//! Run headers and summary blocks emitted through the `log` facade.

use crate::models::RunSummary;

/// Log a header
pub fn header(title: &str) {
    let border = "═".repeat(60);
    log::info!("{}", border);
    log::info!("  {}", title);
    log::info!("{}", border);
}

/// Log a summary section
pub fn summary(title: &str, items: &[(&str, String)]) {
    log::info!("[SUMMARY] {}", title);
    for (key, value) in items {
        log::info!("    {}: {}", key, value);
    }
}

/// Key/value lines describing a finished run.
pub fn run_items(summary: &RunSummary) -> Vec<(&'static str, String)> {
    vec![
        ("Discovered", summary.discovered.to_string()),
        ("Stored", summary.stored.to_string()),
        ("Skipped", summary.skipped.to_string()),
        ("Failed", summary.failed.to_string()),
        ("Elapsed", format!("{:.1}s", summary.elapsed_secs())),
    ]
}
