//! Discovery and parsing of benchmark result files.

use crate::errors::{VlmBenchError, VlmBenchResult};
use crate::result_set::{BenchmarkRecord, ResultSet};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

/// Extension of result files inside the results directory
pub const RESULT_FILE_EXTENSION: &str = "json";

/// Lists the result files directly inside `dir`, sorted by path.
///
/// Directory listing order differs between platforms, so the files are
/// always sorted before being handed out.
pub fn discover_result_files(dir: &Path) -> VlmBenchResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        tracing::warn!("Results directory {} does not exist", dir.display());
        return Err(VlmBenchError::NoResultFiles(dir.to_path_buf()));
    }

    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let extension = path.extension()?.to_string_lossy().to_lowercase();
            if path.is_file() && extension == RESULT_FILE_EXTENSION {
                Some(path)
            } else {
                None
            }
        })
        .collect();

    if files.is_empty() {
        return Err(VlmBenchError::NoResultFiles(dir.to_path_buf()));
    }

    files.sort();
    tracing::debug!("Discovered {} result files in {}", files.len(), dir.display());
    Ok(files)
}

/// Short label for a result file: the file name without any directory part.
///
/// Both `/` and `\` are treated as separators so identifiers produced on
/// another platform reduce to the same label.
pub fn display_name(identifier: impl AsRef<Path>) -> String {
    let path = identifier.as_ref();
    let name: Cow<'_, str> = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => path.to_string_lossy(),
    };

    name.rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Reads one result file into a [`ResultSet`].
///
/// The whole file must parse; there is no partial recovery.
pub fn load_result_set(path: impl AsRef<Path>) -> VlmBenchResult<ResultSet> {
    let path = path.as_ref();
    tracing::debug!("Loading result file {}", path.display());

    let content = fs::read_to_string(path)?;
    let records: Vec<BenchmarkRecord> =
        serde_json::from_str(&content).map_err(|e| VlmBenchError::parse(path, e))?;

    let source_name = display_name(path);
    for (row_id, record) in records.iter().enumerate() {
        if matches!(record.total_frames, Some(total) if total <= 0.0) {
            tracing::warn!(
                "{} row {} reports no frames, excluded from frame coverage",
                source_name,
                row_id
            );
        }
    }

    let result_set = ResultSet::from_records(source_name, records)?.with_path(path);
    tracing::info!(
        "Loaded {} records from {}",
        result_set.len(),
        result_set.source_name()
    );
    Ok(result_set)
}

/// Loads every selected file, failing on the first one that does not parse.
///
/// Files are told apart by display name, so two selected files sharing a
/// name (same file name in different directories) are rejected.
pub fn load_result_sets<P: AsRef<Path>>(paths: &[P]) -> VlmBenchResult<Vec<ResultSet>> {
    if paths.is_empty() {
        return Err(VlmBenchError::NoSourcesSelected);
    }
    let result_sets: Vec<ResultSet> = paths.iter().map(load_result_set).collect::<Result<_, _>>()?;
    ensure_unique_sources(&result_sets)?;
    Ok(result_sets)
}

/// Fails when two result sets carry the same `source_name`
pub fn ensure_unique_sources(result_sets: &[ResultSet]) -> VlmBenchResult<()> {
    for (idx, set) in result_sets.iter().enumerate() {
        let clashes: Vec<&ResultSet> = result_sets[idx..]
            .iter()
            .filter(|other| other.source_name() == set.source_name())
            .collect();
        if clashes.len() > 1 {
            return Err(VlmBenchError::DuplicateSource {
                source_name: set.source_name().to_string(),
                paths: clashes
                    .iter()
                    .map(|other| {
                        other
                            .path()
                            .map(Path::to_path_buf)
                            .unwrap_or_else(|| PathBuf::from(other.source_name()))
                    })
                    .collect(),
            });
        }
    }
    Ok(())
}
