use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::metric_aggregator::DEFAULT_HISTOGRAM_BINS;
use crate::reporting::ReportFormat;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Prefix of environment variables overriding the configuration
pub const ENV_PREFIX: &str = "VLM_BENCH";

/// Directory scanned for result files unless configured otherwise
pub const DEFAULT_RESULTS_DIR: &str = "runs";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,
    #[serde(default)]
    pub default_format: ReportFormat,
}

fn default_results_dir() -> PathBuf {
    PathBuf::from(DEFAULT_RESULTS_DIR)
}

fn default_histogram_bins() -> usize {
    DEFAULT_HISTOGRAM_BINS
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            results_dir: default_results_dir(),
            histogram_bins: default_histogram_bins(),
            default_format: ReportFormat::default(),
        }
    }
}

impl DashboardConfig {
    /// Loads defaults, then the optional file, then `VLM_BENCH_*` variables.
    ///
    /// A `.env` file in the working directory is read first so its values
    /// take part in the environment layer.
    pub fn load(path: Option<&Path>) -> VlmBenchResult<Self> {
        if let Ok(env_file) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", env_file.display());
        }

        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.is_file() {
                return Err(VlmBenchError::ConfigError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(File::from(path));
        }

        let config: Self = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> VlmBenchResult<()> {
        if self.histogram_bins == 0 {
            return Err(VlmBenchError::ConfigError(
                "histogram_bins must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
