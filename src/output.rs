//! CLI output formatting for the pipeline stages.
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure — no I/O, no side effects.
//!
//! Lines lead with a status word so a batch log scans vertically:
//!
//! ```text
//! OK  /out/ios/icon-57.png (57x57) created
//! WARNING  source image /art/missing.png does not exist
//! ERROR  resize failed for /out/bad.png: convert failed (exit 1): ...
//! Created 12 of 14 images (2 skipped)
//! ```

use crate::resolve::ResolvedBatch;
use crate::runner::{BatchReport, TaskStatus};
use std::collections::BTreeSet;

/// Summary of the resolution stage: task count, tag filter effect,
/// unmatched-pattern warnings.
pub fn format_resolve_summary(batch: &ResolvedBatch, active_tags: &BTreeSet<String>) -> Vec<String> {
    let mut lines = Vec::new();
    for warning in &batch.warnings {
        lines.push(format!("WARNING  {warning}"));
    }
    if batch.tasks.is_empty() {
        let tags: Vec<&str> = active_tags.iter().map(String::as_str).collect();
        lines.push(format!(
            "No images matching the tags '{}' found.",
            tags.join(",")
        ));
    } else {
        lines.push(format!("Resolved {} image task(s)", batch.tasks.len()));
    }
    if batch.filtered_out > 0 {
        lines.push(format!(
            "{} image entries excluded by tag filter",
            batch.filtered_out
        ));
    }
    lines
}

/// Per-task outcomes followed by runner warnings and a count summary.
pub fn format_batch_report(report: &BatchReport) -> Vec<String> {
    let mut lines = Vec::new();
    for outcome in &report.outcomes {
        let line = match &outcome.status {
            TaskStatus::Created => format!(
                "OK  {} ({}) created",
                outcome.target.display(),
                outcome.resolution
            ),
            TaskStatus::MissingSource => format!(
                "WARNING  source image {} does not exist",
                outcome.source.display()
            ),
            TaskStatus::ResizeFailed(error) => format!(
                "ERROR  resize failed for {}: {}",
                outcome.target.display(),
                error
            ),
            TaskStatus::OptimizeFailed(error) => format!(
                "WARNING  optimizer failed for {}: {}",
                outcome.target.display(),
                error
            ),
        };
        lines.push(line);
    }
    for warning in &report.warnings {
        lines.push(format!("WARNING  {warning}"));
    }
    lines.push(format!(
        "Created {} of {} images ({} skipped)",
        report.created(),
        report.outcomes.len(),
        report.skipped()
    ));
    lines
}

pub fn print_resolve_summary(batch: &ResolvedBatch, active_tags: &BTreeSet<String>) {
    for line in format_resolve_summary(batch, active_tags) {
        println!("  {line}");
    }
}

pub fn print_batch_report(report: &BatchReport) {
    for line in format_batch_report(report) {
        println!("  {line}");
    }
}
