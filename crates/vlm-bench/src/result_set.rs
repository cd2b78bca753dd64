use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::question_type::label_for;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One benchmark question as written by the evaluation harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRecord {
    #[serde(default)]
    pub question: String,
    /// One letter category code, see [`crate::question_type`]
    #[serde(default)]
    pub question_type: Option<String>,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
    pub is_correct: bool,
    /// Seconds the model took to answer
    pub latency: f64,
    #[serde(default)]
    pub total_frames: Option<f64>,
    #[serde(default)]
    pub frames_analyzed: Option<f64>,
    /// Model or configuration that produced this answer
    pub video_analyzer: String,
}

impl BenchmarkRecord {
    /// Share of the video's frames the model looked at, as a percentage.
    ///
    /// Undefined (None) when either frame field is missing or the video
    /// reports no frames at all.
    pub fn percentual_frames(&self) -> Option<f64> {
        match (self.frames_analyzed, self.total_frames) {
            (Some(analyzed), Some(total)) if total > 0.0 => Some(analyzed / total * 100.0),
            _ => None,
        }
    }

    /// Display label of the question type, unknown codes kept verbatim
    pub fn question_type_label(&self) -> Option<&str> {
        self.question_type.as_deref().map(label_for)
    }
}

/// A record tagged with its position in the originating file
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedRecord {
    pub row_id: usize,
    pub record: BenchmarkRecord,
}

/// All records of one result file
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    source_name: String,
    path: Option<PathBuf>,
    rows: Vec<TaggedRecord>,
    has_question_type: bool,
    has_frame_fields: bool,
}

impl ResultSet {
    /// Builds a result set, numbering records in the order given.
    ///
    /// Optional columns count as present when any record carries them.
    pub fn from_records(
        source_name: impl Into<String>,
        records: Vec<BenchmarkRecord>,
    ) -> VlmBenchResult<Self> {
        let source_name = source_name.into();
        if records.is_empty() {
            return Err(VlmBenchError::EmptyResultSet(source_name));
        }

        let has_question_type = records.iter().any(|r| r.question_type.is_some());
        let has_frame_fields = records.iter().any(|r| r.total_frames.is_some())
            && records.iter().any(|r| r.frames_analyzed.is_some());

        let rows = records
            .into_iter()
            .enumerate()
            .map(|(row_id, record)| TaggedRecord { row_id, record })
            .collect();

        Ok(Self {
            source_name,
            path: None,
            rows,
            has_question_type,
            has_frame_fields,
        })
    }

    pub(crate) fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// File the records were read from, if they came from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn rows(&self) -> &[TaggedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_question_type(&self) -> bool {
        self.has_question_type
    }

    /// Whether frame coverage can be derived for this file
    pub fn has_frame_fields(&self) -> bool {
        self.has_frame_fields
    }

    /// Distinct `video_analyzer` values in order of first appearance
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = Vec::new();
        for row in &self.rows {
            let model = row.record.video_analyzer.as_str();
            if !models.contains(&model) {
                models.push(model);
            }
        }
        models
    }

    /// Keeps only the rows of one model. Row ids and column presence are
    /// inherited from the full file.
    pub(crate) fn retain_model(&self, model: &str) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.record.video_analyzer == model)
            .cloned()
            .collect();

        Self {
            source_name: self.source_name.clone(),
            path: self.path.clone(),
            rows,
            has_question_type: self.has_question_type,
            has_frame_fields: self.has_frame_fields,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn record(is_correct: bool, latency: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            question: "What happens next?".to_string(),
            question_type: None,
            options: vec!["A".to_string(), "B".to_string()],
            answer: "A".to_string(),
            is_correct,
            latency,
            total_frames: None,
            frames_analyzed: None,
            video_analyzer: "qwen2-vl".to_string(),
        }
    }

    pub fn typed(code: &str, is_correct: bool, latency: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            question_type: Some(code.to_string()),
            ..record(is_correct, latency)
        }
    }

    pub fn framed(analyzed: f64, total: f64) -> BenchmarkRecord {
        BenchmarkRecord {
            frames_analyzed: Some(analyzed),
            total_frames: Some(total),
            ..record(true, 1.0)
        }
    }

    pub fn by_model(model: &str, is_correct: bool) -> BenchmarkRecord {
        BenchmarkRecord {
            video_analyzer: model.to_string(),
            ..record(is_correct, 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_percentual_frames() {
        assert_eq!(framed(25.0, 50.0).percentual_frames(), Some(50.0));
        assert_eq!(framed(32.0, 32.0).percentual_frames(), Some(100.0));
    }

    #[test]
    fn test_percentual_frames_undefined() {
        assert_eq!(framed(10.0, 0.0).percentual_frames(), None);
        assert_eq!(record(true, 1.0).percentual_frames(), None);

        let partial = BenchmarkRecord {
            total_frames: Some(50.0),
            ..record(true, 1.0)
        };
        assert_eq!(partial.percentual_frames(), None);
    }

    #[test]
    fn test_row_ids_follow_input_order() {
        let set = ResultSet::from_records(
            "run.json",
            vec![record(true, 1.0), record(false, 2.0), record(true, 3.0)],
        )
        .unwrap();

        let ids: Vec<usize> = set.rows().iter().map(|r| r.row_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert_eq!(set.rows()[1].record.latency, 2.0);
        assert_eq!(set.source_name(), "run.json");
    }

    #[test]
    fn test_empty_result_set_is_rejected() {
        let err = ResultSet::from_records("empty.json", Vec::new()).unwrap_err();
        assert!(matches!(err, VlmBenchError::EmptyResultSet(name) if name == "empty.json"));
    }

    #[test]
    fn test_column_presence() {
        let plain = ResultSet::from_records("a.json", vec![record(true, 1.0)]).unwrap();
        assert!(!plain.has_question_type());
        assert!(!plain.has_frame_fields());

        let rich = ResultSet::from_records(
            "b.json",
            vec![typed("U", true, 1.0), framed(1.0, 2.0)],
        )
        .unwrap();
        assert!(rich.has_question_type());
        assert!(rich.has_frame_fields());
    }

    #[test]
    fn test_models_in_first_appearance_order() {
        let set = ResultSet::from_records(
            "mixed.json",
            vec![
                by_model("llava", true),
                by_model("qwen2-vl", false),
                by_model("llava", true),
            ],
        )
        .unwrap();
        assert_eq!(set.models(), vec!["llava", "qwen2-vl"]);
    }

    #[test]
    fn test_question_type_label() {
        assert_eq!(typed("U", true, 1.0).question_type_label(), Some("Compreensão Básica"));
        assert_eq!(typed("X", true, 1.0).question_type_label(), Some("X"));
        assert_eq!(record(true, 1.0).question_type_label(), None);
    }
}
