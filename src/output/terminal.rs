// Colored terminal output for run summaries.
//
// main.rs delegates here once a pass has finished and its artifacts are
// on disk.

use std::path::Path;

use colored::Colorize;

use crate::batch::BatchLog;
use crate::topics::correlation::TopicStatistics;

/// How many skipped items to list before summarizing the rest.
const MAX_LISTED_SKIPS: usize = 10;

/// Display what a pass accepted and skipped.
pub fn display_batch_log(title: &str, log: &BatchLog) {
    println!("\n{}", format!("=== {title} ===").bold());
    println!("  Accepted: {}", log.accepted().to_string().green());

    let skipped = log.skipped();
    if skipped.is_empty() {
        println!("  Skipped:  {}", "0".dimmed());
        return;
    }

    println!("  Skipped:  {}", skipped.len().to_string().yellow());
    for item in skipped.iter().take(MAX_LISTED_SKIPS) {
        println!(
            "    {} {}",
            super::truncate_chars(&item.item, 40).bold(),
            super::truncate_chars(&item.reason, 100).dimmed()
        );
    }
    if skipped.len() > MAX_LISTED_SKIPS {
        println!(
            "    {}",
            format!("... and {} more", skipped.len() - MAX_LISTED_SKIPS).dimmed()
        );
    }
}

/// Display the strongest topic correlations, both directions.
pub fn display_top_correlations(stats: &TopicStatistics, n: usize) {
    let mut defined: Vec<_> = stats
        .correlations
        .iter()
        .filter_map(|(pair, r)| r.map(|r| (*pair, r)))
        .collect();
    if defined.is_empty() {
        println!("  {}", "No defined topic correlations".dimmed());
        return;
    }
    defined.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()).then(a.0.cmp(&b.0)));

    println!("\n  Strongest topic correlations:");
    for (pair, r) in defined.into_iter().take(n) {
        let value = format!("{r:+.3}");
        let colored_value = if r >= 0.0 { value.green() } else { value.red() };
        println!("    {:>9}  {}", pair.to_string(), colored_value);
    }
}

/// Display where the artifacts landed.
pub fn display_outputs(snapshot: Option<&Path>, payload: &Path) {
    if let Some(snapshot) = snapshot {
        println!("  Snapshot: {}", snapshot.display());
    }
    println!("  Payload:  {}", payload.display().to_string().bold());
}
