use polars::error::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading and aggregating benchmark results
#[derive(Error, Debug)]
pub enum VlmBenchError {
    #[error("Failed to load configuration: {0}")]
    ConfigError(String),

    #[error("No result files found in {0}")]
    NoResultFiles(PathBuf),

    #[error("No result files selected")]
    NoSourcesSelected,

    #[error("Failed to parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Several selected files are named {source_name}: {paths:?}")]
    DuplicateSource {
        source_name: String,
        paths: Vec<PathBuf>,
    },

    #[error("Result set {0} has no records")]
    EmptyResultSet(String),

    #[error("{source_name} mixes several models, choose one of: {}", .available.join(", "))]
    ModelSelectionRequired {
        source_name: String,
        available: Vec<String>,
    },

    #[error("Model '{model}' not found in {source_name}")]
    UnknownModel { source_name: String, model: String },

    #[error("Failed to serialize report: {0}")]
    SerializeError(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("DataFrame error: {0}")]
    DataFrameError(String),
}

/// Result type for dashboard operations
pub type VlmBenchResult<T> = Result<T, VlmBenchError>;

impl VlmBenchError {
    /// Wraps a JSON failure with the file it came from
    pub fn parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        VlmBenchError::ParseError {
            path: path.into(),
            source,
        }
    }
}

impl From<PolarsError> for VlmBenchError {
    fn from(err: PolarsError) -> Self {
        VlmBenchError::DataFrameError(err.to_string())
    }
}

impl From<config::ConfigError> for VlmBenchError {
    fn from(err: config::ConfigError) -> Self {
        VlmBenchError::ConfigError(err.to_string())
    }
}
