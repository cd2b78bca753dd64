use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::reporting::types::{
    round2, LatencyDistribution, LatencyGrouping, ModelDetail, OverviewReport,
    QuestionTypeAccuracy,
};
use polars::{io::csv::QuoteStyle, prelude::*};
use serde::Deserialize;
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// Output formats a report can be written in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Table,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn generator(&self) -> Box<dyn ReportGenerator> {
        match self {
            ReportFormat::Table => Box::new(TableReportGenerator),
            ReportFormat::Json => Box::new(JsonReportGenerator),
            ReportFormat::Csv => Box::new(CsvReportGenerator),
            ReportFormat::Markdown => Box::new(MarkdownReportGenerator),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportFormat::Table => write!(f, "table"),
            ReportFormat::Json => write!(f, "json"),
            ReportFormat::Csv => write!(f, "csv"),
            ReportFormat::Markdown => write!(f, "markdown"),
        }
    }
}

impl FromStr for ReportFormat {
    type Err = VlmBenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" | "text" => Ok(ReportFormat::Table),
            "json" => Ok(ReportFormat::Json),
            "csv" => Ok(ReportFormat::Csv),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            other => Err(VlmBenchError::ConfigError(format!(
                "unknown report format: {}",
                other
            ))),
        }
    }
}

/// Trait for report generators
pub trait ReportGenerator {
    fn overview(&self, report: &OverviewReport, out: &mut dyn Write) -> VlmBenchResult<()>;
    fn model_detail(&self, detail: &ModelDetail, out: &mut dyn Write) -> VlmBenchResult<()>;
}

/// Writes the full report, every observation included, as pretty JSON
pub struct JsonReportGenerator;

impl ReportGenerator for JsonReportGenerator {
    fn overview(&self, report: &OverviewReport, out: &mut dyn Write) -> VlmBenchResult<()> {
        serde_json::to_writer_pretty(&mut *out, report)?;
        writeln!(out)?;
        Ok(())
    }

    fn model_detail(&self, detail: &ModelDetail, out: &mut dyn Write) -> VlmBenchResult<()> {
        serde_json::to_writer_pretty(&mut *out, detail)?;
        writeln!(out)?;
        Ok(())
    }
}

/// Writes the headline table as CSV
pub struct CsvReportGenerator;

impl CsvReportGenerator {
    fn write(df: &mut DataFrame, out: &mut dyn Write) -> VlmBenchResult<()> {
        CsvWriter::new(out)
            .include_header(true)
            .with_separator(b',')
            .with_quote_style(QuoteStyle::NonNumeric)
            .finish(df)
            .map_err(|e| VlmBenchError::DataFrameError(format!("Failed to write CSV: {}", e)))
    }
}

impl ReportGenerator for CsvReportGenerator {
    fn overview(&self, report: &OverviewReport, out: &mut dyn Write) -> VlmBenchResult<()> {
        let rows = &report.summary.rows;
        let mut df = DataFrame::new(vec![
            Series::new(
                "source_name",
                rows.iter().map(|r| r.source_name.as_str()).collect::<Vec<_>>(),
            ),
            Series::new(
                "accuracy",
                rows.iter().map(|r| round2(r.accuracy)).collect::<Vec<_>>(),
            ),
            Series::new(
                "mean_latency",
                rows.iter().map(|r| round2(r.mean_latency)).collect::<Vec<_>>(),
            ),
            Series::new(
                "mean_frame_coverage",
                rows.iter()
                    .map(|r| r.mean_frame_coverage.map(round2))
                    .collect::<Vec<_>>(),
            ),
            Series::new(
                "total_questions",
                rows.iter()
                    .map(|r| r.total_questions as i64)
                    .collect::<Vec<_>>(),
            ),
        ])?;
        Self::write(&mut df, out)
    }

    fn model_detail(&self, detail: &ModelDetail, out: &mut dyn Write) -> VlmBenchResult<()> {
        let metrics = headline_metrics(detail);
        let mut df = DataFrame::new(vec![
            Series::new(
                "metric",
                metrics.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
            ),
            Series::new(
                "value",
                metrics.iter().map(|(_, value)| value.as_str()).collect::<Vec<_>>(),
            ),
        ])?;
        Self::write(&mut df, out)
    }
}

/// Markdown tables, suitable for pasting into notes and pull requests
pub struct MarkdownReportGenerator;

impl ReportGenerator for MarkdownReportGenerator {
    fn overview(&self, report: &OverviewReport, out: &mut dyn Write) -> VlmBenchResult<()> {
        writeln!(out, "# Benchmark Overview")?;
        writeln!(out)?;
        writeln!(out, "Generated: {}", report.generated_at.to_rfc3339())?;
        writeln!(out)?;
        for section in overview_sections(report) {
            section.write_markdown(out)?;
        }
        Ok(())
    }

    fn model_detail(&self, detail: &ModelDetail, out: &mut dyn Write) -> VlmBenchResult<()> {
        writeln!(out, "# {} / {}", detail.source_name, detail.model)?;
        writeln!(out)?;
        for section in detail_sections(detail) {
            section.write_markdown(out)?;
        }
        Ok(())
    }
}

/// Aligned plain text for the terminal
pub struct TableReportGenerator;

impl ReportGenerator for TableReportGenerator {
    fn overview(&self, report: &OverviewReport, out: &mut dyn Write) -> VlmBenchResult<()> {
        for section in overview_sections(report) {
            section.write_text(out)?;
        }
        Ok(())
    }

    fn model_detail(&self, detail: &ModelDetail, out: &mut dyn Write) -> VlmBenchResult<()> {
        for section in detail_sections(detail) {
            section.write_text(out)?;
        }
        Ok(())
    }
}

/// A titled table plus free-form notes, rendered by the text formats
struct Section {
    title: String,
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
    notes: Vec<String>,
}

impl Section {
    fn new(title: impl Into<String>, headers: Vec<&'static str>) -> Self {
        Self {
            title: title.into(),
            headers,
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(idx))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    fn write_text(&self, out: &mut dyn Write) -> VlmBenchResult<()> {
        writeln!(out, "{}", self.title)?;
        writeln!(out, "{}", "=".repeat(self.title.chars().count()))?;

        if !self.headers.is_empty() {
            let widths = self.widths();
            let line = |cells: Vec<&str>| -> String {
                cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            };

            writeln!(out, "{}", line(self.headers.clone()))?;
            writeln!(
                out,
                "{}",
                widths
                    .iter()
                    .map(|w| "-".repeat(*w))
                    .collect::<Vec<_>>()
                    .join("  ")
            )?;
            for row in &self.rows {
                writeln!(out, "{}", line(row.iter().map(String::as_str).collect()))?;
            }
        }

        for note in &self.notes {
            writeln!(out, "{}", note)?;
        }
        writeln!(out)?;
        Ok(())
    }

    fn write_markdown(&self, out: &mut dyn Write) -> VlmBenchResult<()> {
        writeln!(out, "## {}", self.title)?;
        writeln!(out)?;

        if !self.headers.is_empty() {
            writeln!(out, "| {} |", self.headers.join(" | "))?;
            writeln!(
                out,
                "|{}|",
                self.headers
                    .iter()
                    .map(|h| "-".repeat(h.chars().count() + 2))
                    .collect::<Vec<_>>()
                    .join("|")
            )?;
            for row in &self.rows {
                writeln!(out, "| {} |", row.join(" | "))?;
            }
            writeln!(out)?;
        }

        for note in &self.notes {
            writeln!(out, "{}", note)?;
            writeln!(out)?;
        }
        Ok(())
    }
}

fn fmt2(value: f64) -> String {
    format!("{:.2}", round2(value))
}

fn fmt2_opt(value: Option<f64>) -> String {
    value.map(fmt2).unwrap_or_else(|| "-".to_string())
}

fn headline_metrics(detail: &ModelDetail) -> Vec<(&'static str, String)> {
    vec![
        ("model", detail.model.clone()),
        ("accuracy", fmt2(detail.accuracy)),
        ("mean_latency", fmt2(detail.mean_latency)),
        ("total_questions", detail.total_questions.to_string()),
        ("min_latency", fmt2(detail.latency_stats.min)),
        ("max_latency", fmt2(detail.latency_stats.max)),
        ("median_latency", fmt2(detail.latency_stats.median)),
    ]
}

fn latency_section(title: &str, distribution: &LatencyDistribution) -> Section {
    let group_header = match distribution.grouping {
        LatencyGrouping::Source => "Source",
        LatencyGrouping::QuestionType => "Question type",
        LatencyGrouping::Ungrouped => "Group",
    };
    let mut section = Section::new(
        title,
        vec![group_header, "Questions", "Min (s)", "Median (s)", "Max (s)"],
    );

    for group in &distribution.groups {
        section.rows.push(vec![
            group.label.clone(),
            group.points.len().to_string(),
            fmt2(group.stats.min),
            fmt2(group.stats.median),
            fmt2(group.stats.max),
        ]);
    }
    section
}

fn accuracy_section(title: &str, accuracy: &QuestionTypeAccuracy, with_source: bool) -> Section {
    let headers = if with_source {
        vec!["Source", "Question type", "Accuracy (%)", "Questions"]
    } else {
        vec!["Question type", "Accuracy (%)", "Questions"]
    };
    let mut section = Section::new(title, headers);

    for bar in &accuracy.bars {
        let mut row = Vec::with_capacity(4);
        if with_source {
            row.push(bar.source_name.clone());
        }
        row.push(bar.question_type.clone());
        row.push(fmt2(bar.accuracy));
        row.push(bar.total_questions.to_string());
        section.rows.push(row);
    }

    if !accuracy.excluded_sources.is_empty() {
        section.notes.push(format!(
            "Without question types, not included: {}",
            accuracy.excluded_sources.join(", ")
        ));
    }
    section
}

fn overview_sections(report: &OverviewReport) -> Vec<Section> {
    let mut summary = Section::new(
        "Experiment overview",
        vec![
            "Source",
            "Accuracy (%)",
            "Mean latency (s)",
            "Frames seen (%)",
            "Questions",
        ],
    );
    for row in &report.summary.rows {
        summary.rows.push(vec![
            row.source_name.clone(),
            fmt2(row.accuracy),
            fmt2(row.mean_latency),
            fmt2_opt(row.mean_frame_coverage),
            row.total_questions.to_string(),
        ]);
    }

    let mut sections = vec![
        summary,
        latency_section("Latency by experiment", &report.latency_by_source),
    ];
    if report.accuracy_by_question_type.is_available() {
        sections.push(accuracy_section(
            "Accuracy by question type",
            &report.accuracy_by_question_type,
            true,
        ));
    }
    sections
}

fn detail_sections(detail: &ModelDetail) -> Vec<Section> {
    let mut headline = Section::new(
        format!("{} / {}", detail.source_name, detail.model),
        vec!["Metric", "Value"],
    );
    headline.rows = vec![
        vec!["Accuracy (%)".to_string(), fmt2(detail.accuracy)],
        vec!["Mean latency (s)".to_string(), fmt2(detail.mean_latency)],
        vec!["Questions".to_string(), detail.total_questions.to_string()],
    ];
    if detail.available_models.len() > 1 {
        headline.notes.push(format!(
            "Models in this file: {}",
            detail.available_models.join(", ")
        ));
    }

    let stats = &detail.latency_stats;
    let mut latency = latency_section("Latency per question", &detail.latency_distribution);
    latency.notes.push(format!(
        "Minimum latency: {} s | Maximum: {} s | Median: {} s",
        fmt2(stats.min),
        fmt2(stats.max),
        fmt2(stats.median)
    ));

    let mut sections = vec![headline, latency];

    if let Some(accuracy) = &detail.accuracy_by_question_type {
        sections.push(accuracy_section(
            "Accuracy by question type",
            accuracy,
            false,
        ));
    }

    if let Some(histogram) = &detail.frame_coverage {
        let peak = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0).max(1);
        let mut frames = Section::new("Frames analyzed (%)", vec!["Range", "Count", ""]);
        for bin in &histogram.bins {
            frames.rows.push(vec![
                format!("{} - {}", fmt2(bin.lower), fmt2(bin.upper)),
                bin.count.to_string(),
                "#".repeat(bin.count * 40 / peak),
            ]);
        }
        sections.push(frames);
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric_aggregator::MetricAggregator;
    use crate::result_set::test_support::*;
    use crate::result_set::{BenchmarkRecord, ResultSet};

    fn sample_sets() -> Vec<ResultSet> {
        vec![
            ResultSet::from_records(
                "a.json",
                vec![
                    typed("U", true, 1.234),
                    typed("A", false, 2.0),
                    typed("A", false, 3.0),
                ],
            )
            .unwrap(),
            ResultSet::from_records("b.json", vec![record(true, 0.5)]).unwrap(),
        ]
    }

    fn render(generator: &dyn ReportGenerator, report: &OverviewReport) -> String {
        let mut buffer = Vec::new();
        generator.overview(report, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert_eq!("MD".parse::<ReportFormat>().unwrap(), ReportFormat::Markdown);
        assert!("xml".parse::<ReportFormat>().is_err());
        assert_eq!(ReportFormat::Csv.to_string(), "csv");
    }

    #[test]
    fn test_table_overview() {
        let report = MetricAggregator::overview(&sample_sets()).unwrap();
        let text = render(&TableReportGenerator, &report);

        assert!(text.contains("Experiment overview"));
        assert!(text.contains("33.33"));
        assert!(text.contains("Compreensão Básica"));
        assert!(text.contains("Without question types, not included: b.json"));
        // best accuracy comes first
        assert!(text.find("b.json").unwrap() < text.find("a.json").unwrap());
    }

    #[test]
    fn test_markdown_overview() {
        let report = MetricAggregator::overview(&sample_sets()).unwrap();
        let text = render(&MarkdownReportGenerator, &report);

        assert!(text.starts_with("# Benchmark Overview"));
        assert!(text.contains("| Source | Accuracy (%) |"));
        assert!(text.contains("| b.json | 100.00 | 0.50 | - | 1 |"));
        assert!(text.contains("| a.json | 3 | 1.23 | 2.00 | 3.00 |"));
    }

    #[test]
    fn test_json_overview_is_rounded() {
        let report = MetricAggregator::overview(&sample_sets()).unwrap();
        let text = render(&JsonReportGenerator, &report);
        let json: serde_json::Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["summary"]["rows"][1]["accuracy"], 33.33);
        assert_eq!(json["latency_by_source"]["groups"][0]["points"][0]["latency"], 1.23);
        assert_eq!(json["accuracy_by_question_type"]["excluded_sources"][0], "b.json");
    }

    #[test]
    fn test_csv_overview() {
        let report = MetricAggregator::overview(&sample_sets()).unwrap();
        let text = render(&CsvReportGenerator, &report);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("source_name"));
        assert!(lines[0].contains("mean_frame_coverage"));
        assert!(lines[1].contains("b.json"));
        assert!(lines[2].contains("a.json"));
        assert!(lines[2].contains("33.33"));
    }

    #[test]
    fn test_detail_rendering() {
        let records = vec![
            BenchmarkRecord {
                frames_analyzed: Some(10.0),
                total_frames: Some(20.0),
                ..typed("R", true, 1.0)
            },
            BenchmarkRecord {
                frames_analyzed: Some(20.0),
                total_frames: Some(20.0),
                ..typed("C", false, 2.0)
            },
        ];
        let set = ResultSet::from_records("frames.json", records).unwrap();
        let detail = MetricAggregator::model_detail(&set, None, 4).unwrap();

        let mut buffer = Vec::new();
        TableReportGenerator.model_detail(&detail, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("Minimum latency: 1.00 s | Maximum: 2.00 s | Median: 1.50 s"));
        assert!(text.contains("Raciocínio Reversivo"));
        assert!(text.contains("Frames analyzed (%)"));

        let mut buffer = Vec::new();
        CsvReportGenerator.model_detail(&detail, &mut buffer).unwrap();
        let csv = String::from_utf8(buffer).unwrap();
        let accuracy_line = csv.lines().find(|l| l.contains("accuracy")).unwrap();
        assert!(accuracy_line.contains("50.00"));
        assert_eq!(csv.lines().count(), 8);
    }
}
