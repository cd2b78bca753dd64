use anyhow::{Context, Result};
use console::Term;
use std::path::{Path, PathBuf};
use vlm_bench::{load_result_set, MetricAggregator, ReportFormat, ResultSet};

use crate::commands::{discover_or_warn, write_report};

/// Detail view of one model in one result file
pub fn handle_inspect(
    dir: &Path,
    file: Option<PathBuf>,
    model: Option<String>,
    bins: usize,
    format: ReportFormat,
    output: Option<&Path>,
) -> Result<()> {
    let file = match file {
        Some(file) => file,
        None => match discover_or_warn(dir)?.and_then(|files| files.into_iter().next()) {
            Some(file) => file,
            None => return Ok(()),
        },
    };

    let result_set = load_result_set(&file)
        .with_context(|| format!("Failed to load {}", file.display()))?;

    let model = match model {
        Some(model) => Some(model),
        None if Term::stdout().is_term() => prompt_for_model(&result_set)?,
        None => None,
    };

    let detail = MetricAggregator::model_detail(&result_set, model.as_deref(), bins)
        .with_context(|| format!("Failed to analyze {}", result_set.source_name()))?;

    write_report(format, output, |generator, out| {
        generator.model_detail(&detail, out)
    })
}

/// Asks which model to analyze when the file holds more than one
fn prompt_for_model(result_set: &ResultSet) -> Result<Option<String>> {
    let models = result_set.models();
    if models.len() <= 1 {
        return Ok(None);
    }

    let mut select = cliclack::select("Choose the model to analyze:");
    for model in &models {
        select = select.item(model.to_string(), model, "");
    }
    let chosen: String = select.interact()?;
    Ok(Some(chosen))
}
