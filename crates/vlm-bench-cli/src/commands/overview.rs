use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use vlm_bench::{load_result_sets, MetricAggregator, ReportFormat};

use crate::commands::{discover_or_warn, write_report};

/// Compares the selected result files, or every file in `dir` when none is
/// selected explicitly
pub fn handle_overview(
    dir: &Path,
    files: Vec<PathBuf>,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let files = if files.is_empty() {
        match discover_or_warn(dir)? {
            Some(files) => files,
            None => return Ok(()),
        }
    } else {
        files
    };

    let result_sets = load_result_sets(&files).context("Failed to load result files")?;
    let report = MetricAggregator::overview(&result_sets).context("Failed to aggregate results")?;

    if !report.accuracy_by_question_type.excluded_sources.is_empty() {
        tracing::info!(
            "Files without question types left out of the type breakdown: {}",
            report.accuracy_by_question_type.excluded_sources.join(", ")
        );
    }

    write_report(format, output, |generator, out| {
        generator.overview(&report, out)
    })
}
