pub mod inspect;
pub mod list;
pub mod overview;

use anyhow::{Context, Result};
use console::style;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use vlm_bench::{discover_result_files, ReportFormat, ReportGenerator, VlmBenchError, VlmBenchResult};

/// Prints a warning for the user on stderr
pub fn print_warning(message: &str) {
    eprintln!("{}: {}", style("Warning").yellow().bold(), message);
}

/// Result files in `dir`, or None after warning the user that there are none
pub fn discover_or_warn(dir: &Path) -> Result<Option<Vec<PathBuf>>> {
    match discover_result_files(dir) {
        Ok(files) => Ok(Some(files)),
        Err(VlmBenchError::NoResultFiles(dir)) => {
            print_warning(&format!("No result files found in {}", dir.display()));
            Ok(None)
        }
        Err(e) => Err(e).context("Failed to scan the results directory"),
    }
}

/// Renders a report to `output`, or to stdout when no file is given
pub fn write_report<F>(format: ReportFormat, output: Option<&Path>, render: F) -> Result<()>
where
    F: FnOnce(&dyn ReportGenerator, &mut dyn Write) -> VlmBenchResult<()>,
{
    let generator = format.generator();

    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            render(generator.as_ref(), &mut writer)?;
            writer.flush()?;
            println!("Report saved to: {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            render(generator.as_ref(), &mut handle)?;
            handle.flush()?;
        }
    }
    Ok(())
}
