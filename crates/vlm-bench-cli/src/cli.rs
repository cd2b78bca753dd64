use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use vlm_bench::{DashboardConfig, ReportFormat};

use crate::commands::inspect::handle_inspect;
use crate::commands::list::handle_list;
use crate::commands::overview::handle_overview;
use crate::logging::{setup_logging, LogLevel};

#[derive(Parser)]
#[command(name = "vlm-bench", author, version, about, long_about = None)]
struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        help = "Path to a TOML or YAML configuration file",
        long_help = "Load dashboard settings from this file. Environment variables prefixed with VLM_BENCH_ override values from the file."
    )]
    config: Option<PathBuf>,

    #[arg(
        long = "log-level",
        global = true,
        value_enum,
        default_value_t = LogLevel::Warn,
        help = "Verbosity of log output on stderr (RUST_LOG takes precedence)"
    )]
    log_level: LogLevel,

    #[arg(
        long = "log-file",
        global = true,
        value_name = "FILE",
        help = "Also write logs to this file"
    )]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Output format accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Aligned text tables
    Table,
    /// Full report including every latency observation
    Json,
    /// Headline metrics only
    Csv,
    /// Markdown tables
    Markdown,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Table => ReportFormat::Table,
            FormatArg::Json => ReportFormat::Json,
            FormatArg::Csv => ReportFormat::Csv,
            FormatArg::Markdown => ReportFormat::Markdown,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// List result files in the results directory
    #[command(about = "List result files in the results directory")]
    List {
        #[arg(
            short,
            long,
            value_name = "DIR",
            help = "Directory holding the result files (defaults to the configured results_dir)"
        )]
        dir: Option<PathBuf>,
    },

    /// Compare several result files
    #[command(about = "Compare accuracy, latency and frame coverage across result files")]
    Overview {
        #[arg(
            short,
            long,
            value_name = "DIR",
            help = "Directory holding the result files (defaults to the configured results_dir)"
        )]
        dir: Option<PathBuf>,

        #[arg(
            short = 'f',
            long = "file",
            value_name = "FILE",
            action = clap::ArgAction::Append,
            help = "Result file to include (can be given multiple times)",
            long_help = "Restrict the overview to these result files. Without this flag every result file in the results directory is used."
        )]
        files: Vec<PathBuf>,

        #[arg(long, value_enum, value_name = "FORMAT", help = "Output format")]
        format: Option<FormatArg>,

        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Save the report to a file instead of printing it"
        )]
        output: Option<PathBuf>,
    },

    /// Analyze one result file
    #[command(about = "Analyze a single result file for one model")]
    Inspect {
        #[arg(
            value_name = "FILE",
            help = "Result file to analyze (defaults to the first file in the results directory)"
        )]
        file: Option<PathBuf>,

        #[arg(
            short,
            long,
            value_name = "DIR",
            help = "Directory holding the result files (defaults to the configured results_dir)"
        )]
        dir: Option<PathBuf>,

        #[arg(
            short,
            long,
            value_name = "MODEL",
            help = "Model to analyze when the file mixes several video analyzers",
            long_help = "Select the video_analyzer to analyze. Only needed when the file contains results for more than one model; on an interactive terminal you are asked otherwise."
        )]
        model: Option<String>,

        #[arg(
            long,
            value_name = "COUNT",
            help = "Number of bins of the frame coverage histogram"
        )]
        bins: Option<usize>,

        #[arg(long, value_enum, value_name = "FORMAT", help = "Output format")]
        format: Option<FormatArg>,

        #[arg(
            short,
            long,
            value_name = "FILE",
            help = "Save the report to a file instead of printing it"
        )]
        output: Option<PathBuf>,
    },
}

pub fn cli() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging(cli.log_level, cli.log_file.as_deref())?;

    let config = DashboardConfig::load(cli.config.as_deref())
        .context("Failed to load dashboard configuration")?;
    tracing::debug!("Using configuration {:?}", config);

    match cli.command {
        Command::List { dir } => {
            let dir = dir.unwrap_or_else(|| config.results_dir.clone());
            handle_list(&dir)?;
        }
        Command::Overview {
            dir,
            files,
            format,
            output,
        } => {
            let dir = dir.unwrap_or_else(|| config.results_dir.clone());
            let format = format.map(Into::into).unwrap_or(config.default_format);
            handle_overview(&dir, files, format, output.as_deref())?;
        }
        Command::Inspect {
            file,
            dir,
            model,
            bins,
            format,
            output,
        } => {
            let dir = dir.unwrap_or_else(|| config.results_dir.clone());
            let format = format.map(Into::into).unwrap_or(config.default_format);
            let bins = bins.unwrap_or(config.histogram_bins);
            handle_inspect(&dir, file, model, bins, format, output.as_deref())?;
        }
    }
    Ok(())
}
