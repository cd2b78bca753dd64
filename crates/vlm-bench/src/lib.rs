pub mod config;
pub mod dataframe_handler;
pub mod errors;
pub mod loader;
pub mod metric_aggregator;
pub mod question_type;
pub mod reporting;
pub mod result_set;

// Re-export main components for easier use
pub use config::DashboardConfig;
pub use dataframe_handler::DataFrameHandler;
pub use errors::{VlmBenchError, VlmBenchResult};
pub use loader::{
    discover_result_files, display_name, ensure_unique_sources, load_result_set, load_result_sets,
};
pub use metric_aggregator::MetricAggregator;
pub use reporting::{ReportFormat, ReportGenerator};
pub use result_set::{BenchmarkRecord, ResultSet, TaggedRecord};
