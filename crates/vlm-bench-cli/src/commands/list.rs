use anyhow::Result;
use console::style;
use std::path::Path;
use vlm_bench::display_name;

use crate::commands::discover_or_warn;

pub fn handle_list(dir: &Path) -> Result<()> {
    let Some(files) = discover_or_warn(dir)? else {
        return Ok(());
    };

    println!("{}", style(format!("Result files in {}", dir.display())).bold());
    for file in &files {
        println!(
            "  {}  {}",
            style(display_name(file)).cyan(),
            style(file.display()).dim()
        );
    }
    Ok(())
}
