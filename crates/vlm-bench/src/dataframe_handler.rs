use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::loader::ensure_unique_sources;
use crate::reporting::types::{
    AccuracyBar, LatencyStats, QuestionTypeAccuracy, SummaryRow, SummaryTable,
};
use crate::result_set::ResultSet;
use polars::prelude::*;
use std::cmp::Ordering;

/// Handles DataFrame operations for benchmark result aggregation
pub struct DataFrameHandler;

impl DataFrameHandler {
    /// Converts result sets into one DataFrame, one row per record.
    ///
    /// `question_type` holds the display label and `percentual_frames` the
    /// frame coverage. Both are null for files that don't expose the
    /// underlying columns.
    pub fn results_to_dataframe(result_sets: &[ResultSet]) -> VlmBenchResult<DataFrame> {
        let refs: Vec<&ResultSet> = result_sets.iter().collect();
        Self::frame_from(&refs)
    }

    fn frame_from(result_sets: &[&ResultSet]) -> VlmBenchResult<DataFrame> {
        let total: usize = result_sets.iter().map(|set| set.len()).sum();

        let mut source_names: Vec<&str> = Vec::with_capacity(total);
        let mut row_ids: Vec<i64> = Vec::with_capacity(total);
        let mut is_correct: Vec<bool> = Vec::with_capacity(total);
        let mut latency: Vec<f64> = Vec::with_capacity(total);
        let mut video_analyzer: Vec<&str> = Vec::with_capacity(total);
        let mut question_type: Vec<Option<&str>> = Vec::with_capacity(total);
        let mut percentual_frames: Vec<Option<f64>> = Vec::with_capacity(total);

        for set in result_sets {
            for row in set.rows() {
                let record = &row.record;
                source_names.push(set.source_name());
                row_ids.push(row.row_id as i64);
                is_correct.push(record.is_correct);
                latency.push(record.latency);
                video_analyzer.push(&record.video_analyzer);
                question_type.push(if set.has_question_type() {
                    record.question_type_label()
                } else {
                    None
                });
                percentual_frames.push(if set.has_frame_fields() {
                    record.percentual_frames()
                } else {
                    None
                });
            }
        }

        DataFrame::new(vec![
            Series::new("source_name", source_names),
            Series::new("row_id", row_ids),
            Series::new("is_correct", is_correct),
            Series::new("latency", latency),
            Series::new("video_analyzer", video_analyzer),
            Series::new("question_type", question_type),
            Series::new("percentual_frames", percentual_frames),
        ])
        .map_err(|e| VlmBenchError::DataFrameError(format!("Failed to create DataFrame: {}", e)))
    }

    /// Accuracy, mean latency and mean frame coverage per file.
    ///
    /// Rows come out best accuracy first; files with equal accuracy keep
    /// the order they were given in.
    pub fn summarize_by_source(result_sets: &[ResultSet]) -> VlmBenchResult<SummaryTable> {
        if result_sets.is_empty() {
            return Err(VlmBenchError::NoSourcesSelected);
        }
        ensure_unique_sources(result_sets)?;

        let df = Self::results_to_dataframe(result_sets)?;
        let agg_df = df
            .lazy()
            .group_by_stable([col("source_name")])
            .agg([
                (col("is_correct").cast(DataType::Float64).mean() * lit(100.0)).alias("accuracy"),
                col("latency").mean().alias("mean_latency"),
                col("percentual_frames").mean().alias("mean_frame_coverage"),
                col("row_id").count().cast(DataType::Int64).alias("total_questions"),
            ])
            .collect()
            .map_err(|e| {
                VlmBenchError::DataFrameError(format!("Failed to aggregate metrics: {}", e))
            })?;

        let names = utf8_values(&agg_df, "source_name")?;
        let accuracy = f64_values(&agg_df, "accuracy")?;
        let mean_latency = f64_values(&agg_df, "mean_latency")?;
        let coverage = f64_values(&agg_df, "mean_frame_coverage")?;
        let counts = i64_values(&agg_df, "total_questions")?;

        let mut rows = Vec::with_capacity(names.len());
        for (idx, source_name) in names.into_iter().enumerate() {
            rows.push(SummaryRow {
                accuracy: accuracy[idx].ok_or_else(|| empty(&source_name))?,
                mean_latency: mean_latency[idx].ok_or_else(|| empty(&source_name))?,
                mean_frame_coverage: coverage[idx],
                total_questions: counts[idx].unwrap_or(0) as usize,
                source_name,
            });
        }

        // Vec::sort_by is stable, ties keep their source order
        rows.sort_by(|a, b| {
            b.accuracy
                .partial_cmp(&a.accuracy)
                .unwrap_or(Ordering::Equal)
        });

        tracing::info!("Summarized {} result files", rows.len());
        Ok(SummaryTable { rows })
    }

    /// Accuracy per (file, question type).
    ///
    /// Only files that carry question types take part; the others are named
    /// in `excluded_sources`.
    pub fn accuracy_by_question_type(
        result_sets: &[ResultSet],
    ) -> VlmBenchResult<QuestionTypeAccuracy> {
        let (typed, untyped): (Vec<&ResultSet>, Vec<&ResultSet>) = result_sets
            .iter()
            .partition(|set| set.has_question_type());

        let excluded_sources: Vec<String> = untyped
            .iter()
            .map(|set| set.source_name().to_string())
            .collect();
        if !excluded_sources.is_empty() {
            tracing::debug!(
                "Question type breakdown skips files without question types: {:?}",
                excluded_sources
            );
        }

        if typed.is_empty() {
            return Ok(QuestionTypeAccuracy {
                bars: Vec::new(),
                excluded_sources,
            });
        }

        let agg_df = Self::frame_from(&typed)?
            .lazy()
            .filter(col("question_type").is_not_null())
            .group_by_stable([col("source_name"), col("question_type")])
            .agg([
                (col("is_correct").cast(DataType::Float64).mean() * lit(100.0)).alias("accuracy"),
                col("row_id").count().cast(DataType::Int64).alias("total_questions"),
            ])
            .collect()
            .map_err(|e| {
                VlmBenchError::DataFrameError(format!(
                    "Failed to aggregate accuracy by question type: {}",
                    e
                ))
            })?;

        let names = utf8_values(&agg_df, "source_name")?;
        let types = utf8_values(&agg_df, "question_type")?;
        let accuracy = f64_values(&agg_df, "accuracy")?;
        let counts = i64_values(&agg_df, "total_questions")?;

        let bars = names
            .into_iter()
            .zip(types)
            .enumerate()
            .filter_map(|(idx, (source_name, question_type))| {
                Some(AccuracyBar {
                    source_name,
                    question_type,
                    accuracy: accuracy[idx]?,
                    total_questions: counts[idx].unwrap_or(0) as usize,
                })
            })
            .collect();

        Ok(QuestionTypeAccuracy {
            bars,
            excluded_sources,
        })
    }

    /// Minimum, maximum, median and mean latency of one result set
    pub fn latency_stats(result_set: &ResultSet) -> VlmBenchResult<LatencyStats> {
        let stats_df = Self::frame_from(&[result_set])?
            .lazy()
            .select(latency_stat_exprs())
            .collect()
            .map_err(|e| {
                VlmBenchError::DataFrameError(format!("Failed to compute latency stats: {}", e))
            })?;

        stats_at(&stats_df, 0).ok_or_else(|| empty(result_set.source_name()))
    }

    /// Latency stats of each labelled group, in the order the groups are given
    pub fn latency_stats_by_group(
        groups: &[(&str, Vec<f64>)],
    ) -> VlmBenchResult<Vec<LatencyStats>> {
        if groups.is_empty() {
            return Ok(Vec::new());
        }

        let mut labels: Vec<&str> = Vec::new();
        let mut latency: Vec<f64> = Vec::new();
        for (label, values) in groups {
            labels.extend(std::iter::repeat(*label).take(values.len()));
            latency.extend_from_slice(values);
        }

        let stats_df = DataFrame::new(vec![
            Series::new("label", labels),
            Series::new("latency", latency),
        ])?
        .lazy()
        .group_by_stable([col("label")])
        .agg(latency_stat_exprs())
        .collect()
        .map_err(|e| {
            VlmBenchError::DataFrameError(format!(
                "Failed to compute latency stats by group: {}",
                e
            ))
        })?;

        let found = utf8_values(&stats_df, "label")?;
        groups
            .iter()
            .map(|(label, _)| {
                found
                    .iter()
                    .position(|name| name == label)
                    .and_then(|idx| stats_at(&stats_df, idx))
                    .ok_or_else(|| empty(label))
            })
            .collect()
    }
}

fn latency_stat_exprs() -> [Expr; 4] {
    [
        col("latency").min().alias("min"),
        col("latency").max().alias("max"),
        col("latency").median().alias("median"),
        col("latency").mean().alias("mean"),
    ]
}

/// Reads the stats written by `latency_stat_exprs` back out of row `idx`
fn stats_at(df: &DataFrame, idx: usize) -> Option<LatencyStats> {
    let value = |name: &str| f64_values(df, name).ok()?.get(idx).copied().flatten();
    Some(LatencyStats {
        min: value("min")?,
        max: value("max")?,
        median: value("median")?,
        mean: value("mean")?,
    })
}

fn empty(source_name: &str) -> VlmBenchError {
    VlmBenchError::EmptyResultSet(source_name.to_string())
}

fn utf8_values(df: &DataFrame, name: &str) -> VlmBenchResult<Vec<String>> {
    Ok(df
        .column(name)?
        .utf8()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn f64_values(df: &DataFrame, name: &str) -> VlmBenchResult<Vec<Option<f64>>> {
    let series = df.column(name)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().collect();
    Ok(values)
}

fn i64_values(df: &DataFrame, name: &str) -> VlmBenchResult<Vec<Option<i64>>> {
    let series = df.column(name)?.cast(&DataType::Int64)?;
    let values = series.i64()?.into_iter().collect();
    Ok(values)
}
