use crate::dataframe_handler::DataFrameHandler;
use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::loader::ensure_unique_sources;
use crate::reporting::types::{
    Histogram, HistogramBin, LatencyDistribution, LatencyGroup, LatencyGrouping, LatencyPoint,
    ModelDetail, OverviewReport,
};
use crate::result_set::ResultSet;
use chrono::Utc;

/// Number of frame coverage buckets used when none is configured
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Label of the single series produced when latency can't be grouped
pub const UNGROUPED_LABEL: &str = "all";

/// Builds the overview and per-model views out of loaded result sets
pub struct MetricAggregator;

impl MetricAggregator {
    /// Keeps only the rows of one model.
    ///
    /// A file with a single model is returned whole and `model` is not
    /// consulted. With several models a choice is required.
    pub fn select_model(result_set: &ResultSet, model: Option<&str>) -> VlmBenchResult<ResultSet> {
        let models = result_set.models();
        if models.len() <= 1 {
            if let Some(chosen) = model.filter(|chosen| !models.contains(chosen)) {
                tracing::warn!(
                    "{} only holds results for {}, ignoring requested model {}",
                    result_set.source_name(),
                    models.first().copied().unwrap_or_default(),
                    chosen
                );
            }
            return Ok(result_set.clone());
        }

        match model {
            Some(chosen) if models.contains(&chosen) => {
                tracing::debug!("Selected model {} in {}", chosen, result_set.source_name());
                Ok(result_set.retain_model(chosen))
            }
            Some(chosen) => Err(VlmBenchError::UnknownModel {
                source_name: result_set.source_name().to_string(),
                model: chosen.to_string(),
            }),
            None => Err(VlmBenchError::ModelSelectionRequired {
                source_name: result_set.source_name().to_string(),
                available: models.iter().map(|m| m.to_string()).collect(),
            }),
        }
    }

    /// Every latency observation, grouped by file or by question type.
    ///
    /// Grouping by question type only uses files that carry question types
    /// and skips rows without one. When no file has them the result is a
    /// single ungrouped series. Each group carries its min, max, median and
    /// mean latency.
    pub fn latency_distribution(
        result_sets: &[ResultSet],
        grouping: LatencyGrouping,
    ) -> VlmBenchResult<LatencyDistribution> {
        ensure_unique_sources(result_sets)?;

        let grouping = match grouping {
            LatencyGrouping::QuestionType
                if !result_sets.iter().any(|set| set.has_question_type()) =>
            {
                LatencyGrouping::Ungrouped
            }
            other => other,
        };

        let mut points_by_label: Vec<(&str, Vec<LatencyPoint>)> = Vec::new();
        for set in result_sets {
            if grouping == LatencyGrouping::QuestionType && !set.has_question_type() {
                continue;
            }

            for row in set.rows() {
                let label = match grouping {
                    LatencyGrouping::Source => set.source_name(),
                    LatencyGrouping::QuestionType => match row.record.question_type_label() {
                        Some(label) => label,
                        None => continue,
                    },
                    LatencyGrouping::Ungrouped => UNGROUPED_LABEL,
                };

                let point = LatencyPoint {
                    source_name: set.source_name().to_string(),
                    row_id: row.row_id,
                    latency: row.record.latency,
                };

                match points_by_label.iter_mut().find(|(l, _)| *l == label) {
                    Some((_, points)) => points.push(point),
                    None => points_by_label.push((label, vec![point])),
                }
            }
        }

        let latencies: Vec<(&str, Vec<f64>)> = points_by_label
            .iter()
            .map(|(label, points)| (*label, points.iter().map(|p| p.latency).collect()))
            .collect();
        let stats = DataFrameHandler::latency_stats_by_group(&latencies)?;

        let groups = points_by_label
            .into_iter()
            .zip(stats)
            .map(|((label, points), stats)| LatencyGroup {
                label: label.to_string(),
                points,
                stats,
            })
            .collect();

        Ok(LatencyDistribution { grouping, groups })
    }

    /// Buckets frame coverage into `bins` equal-width bins between the
    /// smallest and largest value.
    ///
    /// Returns None when the file has no frame columns or no record has a
    /// defined coverage.
    pub fn frame_coverage_histogram(
        result_set: &ResultSet,
        bins: usize,
    ) -> VlmBenchResult<Option<Histogram>> {
        if bins == 0 {
            return Err(VlmBenchError::ConfigError(
                "histogram needs at least one bin".to_string(),
            ));
        }
        if !result_set.has_frame_fields() {
            return Ok(None);
        }

        let values: Vec<f64> = result_set
            .rows()
            .iter()
            .filter_map(|row| row.record.percentual_frames())
            .collect();
        if values.is_empty() {
            return Ok(None);
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = (max - min) / bins as f64;

        if width == 0.0 {
            return Ok(Some(Histogram {
                bins: vec![HistogramBin {
                    lower: min,
                    upper: max,
                    count: values.len(),
                }],
            }));
        }

        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                lower: min + i as f64 * width,
                upper: if i + 1 == bins {
                    max
                } else {
                    min + (i + 1) as f64 * width
                },
                count: 0,
            })
            .collect();

        for value in values {
            let idx = (((value - min) / width).floor() as usize).min(bins - 1);
            histogram[idx].count += 1;
        }

        Ok(Some(Histogram { bins: histogram }))
    }

    /// Detail view of one model inside one result file
    pub fn model_detail(
        result_set: &ResultSet,
        model: Option<&str>,
        bins: usize,
    ) -> VlmBenchResult<ModelDetail> {
        let available_models: Vec<String> =
            result_set.models().iter().map(|m| m.to_string()).collect();
        let selected = Self::select_model(result_set, model)?;
        let selected_slice = std::slice::from_ref(&selected);

        let summary = DataFrameHandler::summarize_by_source(selected_slice)?;
        let headline = summary
            .rows
            .into_iter()
            .next()
            .ok_or_else(|| VlmBenchError::EmptyResultSet(selected.source_name().to_string()))?;

        let accuracy_by_question_type = if selected.has_question_type() {
            Some(DataFrameHandler::accuracy_by_question_type(selected_slice)?)
        } else {
            None
        };

        let detail = ModelDetail {
            source_name: selected.source_name().to_string(),
            model: selected
                .models()
                .first()
                .map(|m| m.to_string())
                .unwrap_or_default(),
            available_models,
            accuracy: headline.accuracy,
            mean_latency: headline.mean_latency,
            total_questions: headline.total_questions,
            latency_stats: DataFrameHandler::latency_stats(&selected)?,
            latency_distribution: Self::latency_distribution(
                selected_slice,
                LatencyGrouping::QuestionType,
            )?,
            accuracy_by_question_type,
            frame_coverage: Self::frame_coverage_histogram(&selected, bins)?,
        };

        tracing::info!(
            "Built detail for model {} in {} ({} questions)",
            detail.model,
            detail.source_name,
            detail.total_questions
        );
        Ok(detail)
    }

    /// Comparison of several result files
    pub fn overview(result_sets: &[ResultSet]) -> VlmBenchResult<OverviewReport> {
        let summary = DataFrameHandler::summarize_by_source(result_sets)?;
        let accuracy_by_question_type = DataFrameHandler::accuracy_by_question_type(result_sets)?;

        Ok(OverviewReport {
            generated_at: Utc::now(),
            summary,
            latency_by_source: Self::latency_distribution(result_sets, LatencyGrouping::Source)?,
            accuracy_by_question_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result_set::test_support::*;
    use crate::result_set::BenchmarkRecord;

    fn set(name: &str, records: Vec<BenchmarkRecord>) -> ResultSet {
        ResultSet::from_records(name, records).unwrap()
    }

    #[test]
    fn test_select_single_model_returns_everything() {
        let result_set = set("one.json", vec![record(true, 1.0), record(false, 2.0)]);

        let selected = MetricAggregator::select_model(&result_set, None).unwrap();
        assert_eq!(selected, result_set);

        let matching = MetricAggregator::select_model(&result_set, Some("qwen2-vl")).unwrap();
        assert_eq!(matching, result_set);

        // a model the file doesn't hold is logged and ignored
        let ignored = MetricAggregator::select_model(&result_set, Some("other")).unwrap();
        assert_eq!(ignored, result_set);
    }

    #[test]
    fn test_select_model_filters_rows() {
        let result_set = set(
            "mixed.json",
            vec![
                by_model("llava", true),
                by_model("qwen2-vl", false),
                by_model("llava", false),
            ],
        );

        let selected = MetricAggregator::select_model(&result_set, Some("llava")).unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected
            .rows()
            .iter()
            .all(|r| r.record.video_analyzer == "llava"));
        let ids: Vec<usize> = selected.rows().iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_select_model_requires_a_choice() {
        let result_set = set(
            "mixed.json",
            vec![by_model("llava", true), by_model("qwen2-vl", false)],
        );

        match MetricAggregator::select_model(&result_set, None) {
            Err(VlmBenchError::ModelSelectionRequired { available, .. }) => {
                assert_eq!(available, vec!["llava".to_string(), "qwen2-vl".to_string()])
            }
            other => panic!("unexpected result: {:?}", other),
        }

        assert!(matches!(
            MetricAggregator::select_model(&result_set, Some("gpt-4o")),
            Err(VlmBenchError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_latency_by_source_keeps_every_observation() {
        let sets = vec![
            set("a.json", vec![record(true, 1.0), record(true, 2.0)]),
            set("b.json", vec![record(true, 3.0)]),
        ];
        let distribution =
            MetricAggregator::latency_distribution(&sets, LatencyGrouping::Source).unwrap();

        assert_eq!(distribution.grouping, LatencyGrouping::Source);
        assert_eq!(distribution.groups.len(), 2);
        assert_eq!(distribution.groups[0].label, "a.json");
        assert_eq!(distribution.groups[0].values(), vec![1.0, 2.0]);
        assert_eq!(distribution.groups[0].stats.median, 1.5);
        assert_eq!(distribution.groups[1].stats.mean, 3.0);
        assert_eq!(distribution.groups[1].points[0].row_id, 0);
        assert_eq!(distribution.groups[1].points[0].source_name, "b.json");
    }

    #[test]
    fn test_latency_by_question_type() {
        let sets = vec![set(
            "a.json",
            vec![
                typed("U", true, 1.0),
                typed("X", true, 2.0),
                typed("U", true, 3.0),
                record(true, 9.0),
            ],
        )];
        let distribution =
            MetricAggregator::latency_distribution(&sets, LatencyGrouping::QuestionType).unwrap();

        let labels: Vec<&str> = distribution.groups.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["Compreensão Básica", "X"]);
        assert_eq!(distribution.groups[0].values(), vec![1.0, 3.0]);
        assert_eq!(distribution.groups[0].stats.median, 2.0);
        assert_eq!(distribution.groups[1].stats.min, 2.0);
        assert_eq!(distribution.groups[1].stats.max, 2.0);
        let ids: Vec<usize> = distribution.groups[0].points.iter().map(|p| p.row_id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn test_latency_falls_back_to_single_series() {
        let sets = vec![set("a.json", vec![record(true, 1.0), record(false, 2.0)])];
        let distribution =
            MetricAggregator::latency_distribution(&sets, LatencyGrouping::QuestionType).unwrap();

        assert_eq!(distribution.grouping, LatencyGrouping::Ungrouped);
        assert_eq!(distribution.groups.len(), 1);
        assert_eq!(distribution.groups[0].label, UNGROUPED_LABEL);
        assert_eq!(distribution.groups[0].points.len(), 2);
    }

    #[test]
    fn test_same_named_sources_are_not_merged() {
        let sets = vec![
            set("run.json", vec![record(true, 1.0)]),
            set("run.json", vec![record(false, 2.0)]),
        ];

        assert!(matches!(
            MetricAggregator::latency_distribution(&sets, LatencyGrouping::Source),
            Err(VlmBenchError::DuplicateSource { .. })
        ));
        match MetricAggregator::overview(&sets) {
            Err(VlmBenchError::DuplicateSource { source_name, .. }) => {
                assert_eq!(source_name, "run.json")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_histogram_bins() {
        let result_set = set(
            "a.json",
            vec![
                framed(0.0, 100.0),
                framed(10.0, 100.0),
                framed(55.0, 100.0),
                framed(100.0, 100.0),
                framed(3.0, 0.0),
            ],
        );
        let histogram = MetricAggregator::frame_coverage_histogram(&result_set, 10)
            .unwrap()
            .unwrap();

        assert_eq!(histogram.bins.len(), 10);
        assert_eq!(histogram.total(), 4);
        assert_eq!(histogram.bins[0].count, 1);
        assert_eq!(histogram.bins[1].count, 1);
        assert_eq!(histogram.bins[5].count, 1);
        assert_eq!(histogram.bins[9].count, 1);
        assert_eq!(histogram.bins[9].upper, 100.0);
    }

    #[test]
    fn test_histogram_with_identical_values() {
        let result_set = set("a.json", vec![framed(5.0, 10.0), framed(10.0, 20.0)]);
        let histogram = MetricAggregator::frame_coverage_histogram(&result_set, 20)
            .unwrap()
            .unwrap();
        assert_eq!(histogram.bins.len(), 1);
        assert_eq!(histogram.bins[0].count, 2);
        assert_eq!(histogram.bins[0].lower, 50.0);
    }

    #[test]
    fn test_histogram_unavailable() {
        let plain = set("a.json", vec![record(true, 1.0)]);
        assert_eq!(
            MetricAggregator::frame_coverage_histogram(&plain, DEFAULT_HISTOGRAM_BINS).unwrap(),
            None
        );

        let zero = set("b.json", vec![framed(1.0, 0.0)]);
        assert_eq!(
            MetricAggregator::frame_coverage_histogram(&zero, DEFAULT_HISTOGRAM_BINS).unwrap(),
            None
        );

        assert!(matches!(
            MetricAggregator::frame_coverage_histogram(&plain, 0),
            Err(VlmBenchError::ConfigError(_))
        ));
    }

    #[test]
    fn test_model_detail() {
        let records = vec![
            BenchmarkRecord {
                video_analyzer: "llava".to_string(),
                ..typed("U", true, 1.0)
            },
            BenchmarkRecord {
                video_analyzer: "llava".to_string(),
                ..typed("A", false, 3.0)
            },
            BenchmarkRecord {
                video_analyzer: "qwen2-vl".to_string(),
                ..typed("U", true, 10.0)
            },
        ];
        let result_set = set("mixed.json", records);

        let detail =
            MetricAggregator::model_detail(&result_set, Some("llava"), DEFAULT_HISTOGRAM_BINS)
                .unwrap();
        assert_eq!(detail.model, "llava");
        assert_eq!(detail.available_models, vec!["llava", "qwen2-vl"]);
        assert_eq!(detail.total_questions, 2);
        assert_eq!(detail.accuracy, 50.0);
        assert_eq!(detail.mean_latency, 2.0);
        assert_eq!(detail.latency_stats.max, 3.0);
        assert_eq!(detail.latency_distribution.grouping, LatencyGrouping::QuestionType);
        let by_type = detail.accuracy_by_question_type.unwrap();
        assert_eq!(by_type.bars.len(), 2);
        assert!(detail.frame_coverage.is_none());
    }

    #[test]
    fn test_overview() {
        let sets = vec![
            set("a.json", vec![typed("U", false, 2.0)]),
            set("b.json", vec![record(true, 1.0)]),
        ];
        let report = MetricAggregator::overview(&sets).unwrap();

        assert_eq!(report.summary.rows[0].source_name, "b.json");
        assert_eq!(report.latency_by_source.groups.len(), 2);
        assert_eq!(
            report.accuracy_by_question_type.excluded_sources,
            vec!["b.json".to_string()]
        );
    }
}
