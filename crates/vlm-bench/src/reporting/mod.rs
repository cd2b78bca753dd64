pub mod report_generators;
pub mod types;

pub use report_generators::{
    CsvReportGenerator, JsonReportGenerator, MarkdownReportGenerator, ReportFormat,
    ReportGenerator, TableReportGenerator,
};
pub use types::{
    AccuracyBar, Histogram, HistogramBin, LatencyDistribution, LatencyGroup, LatencyGrouping,
    LatencyPoint, LatencyStats, ModelDetail, OverviewReport, QuestionTypeAccuracy, SummaryRow,
    SummaryTable,
};
