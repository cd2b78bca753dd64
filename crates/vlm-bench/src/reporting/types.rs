//! Outputs of the aggregation pipeline.
//!
//! Values are kept at full precision. Rounding to two decimals happens only
//! when a report is written out, either through [`round2`] in the report
//! generators or through the serde helpers on the fields below.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Rounds a value for display
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn serialize_round2<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round2(*value))
}

fn serialize_round2_opt<S: Serializer>(
    value: &Option<f64>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(v) => serializer.serialize_some(&round2(*v)),
        None => serializer.serialize_none(),
    }
}

/// Headline metrics of one result file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub source_name: String,
    /// Percentage of correct answers, 0 to 100
    #[serde(serialize_with = "serialize_round2")]
    pub accuracy: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub mean_latency: f64,
    /// None when frame coverage can't be derived for this file
    #[serde(serialize_with = "serialize_round2_opt")]
    pub mean_frame_coverage: Option<f64>,
    pub total_questions: usize,
}

/// Per-file metrics, best accuracy first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub rows: Vec<SummaryRow>,
}

/// How latency observations are split into series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LatencyGrouping {
    Source,
    QuestionType,
    /// Single series, used when question types are not available
    Ungrouped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyPoint {
    pub source_name: String,
    pub row_id: usize,
    #[serde(serialize_with = "serialize_round2")]
    pub latency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyGroup {
    pub label: String,
    pub points: Vec<LatencyPoint>,
    pub stats: LatencyStats,
}

impl LatencyGroup {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.latency).collect()
    }
}

/// Every latency observation, split into groups for a box plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyDistribution {
    pub grouping: LatencyGrouping,
    pub groups: Vec<LatencyGroup>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyBar {
    pub source_name: String,
    pub question_type: String,
    #[serde(serialize_with = "serialize_round2")]
    pub accuracy: f64,
    pub total_questions: usize,
}

/// Accuracy per question type and file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionTypeAccuracy {
    pub bars: Vec<AccuracyBar>,
    /// Files left out because they carry no question types
    pub excluded_sources: Vec<String>,
}

impl QuestionTypeAccuracy {
    pub fn is_available(&self) -> bool {
        !self.bars.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    #[serde(serialize_with = "serialize_round2")]
    pub lower: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub upper: f64,
    pub count: usize,
}

/// Distribution of frame coverage percentages
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    #[serde(serialize_with = "serialize_round2")]
    pub min: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub max: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub median: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub mean: f64,
}

/// Single file view for one model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetail {
    pub source_name: String,
    pub model: String,
    /// Every model found in the file, including the selected one
    pub available_models: Vec<String>,
    #[serde(serialize_with = "serialize_round2")]
    pub accuracy: f64,
    #[serde(serialize_with = "serialize_round2")]
    pub mean_latency: f64,
    pub total_questions: usize,
    pub latency_stats: LatencyStats,
    pub latency_distribution: LatencyDistribution,
    pub accuracy_by_question_type: Option<QuestionTypeAccuracy>,
    pub frame_coverage: Option<Histogram>,
}

/// Comparison across several result files
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub generated_at: DateTime<Utc>,
    pub summary: SummaryTable,
    pub latency_by_source: LatencyDistribution,
    pub accuracy_by_question_type: QuestionTypeAccuracy,
}
