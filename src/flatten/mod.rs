pub mod rename;
pub mod types;

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::codec::{decode_filename, SearchRecord, EXTENSION};
use crate::errors::FlattenError;
use crate::store::manifest::Manifest;

pub use rename::{external_column_name, rename_columns};
pub use types::{Cell, Dataset, Row};

/// What `flatten_all` does when one file cannot be flattened.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log the failure, remember it, keep going.
    #[default]
    Collect,
    /// Stop at the first failure and return it.
    Abort,
}

/// A file that was skipped under [`ErrorPolicy::Collect`].
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: FlattenError,
}

/// Result of flattening a whole directory.
#[derive(Debug, Default)]
pub struct FlattenReport {
    pub dataset: Dataset,
    pub files: usize,
    pub failures: Vec<FileFailure>,
}

impl FlattenReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Flatten one JSON object into dot-joined columns.
///
/// Nested objects recurse; arrays and scalars become cells as they are.
/// An empty nested object contributes no column.
pub fn flatten_object(object: &Map<String, Value>) -> Row {
    let mut row = Row::new();
    flatten_into(&mut row, None, object);
    row
}

fn flatten_into(row: &mut Row, prefix: Option<&str>, object: &Map<String, Value>) {
    for (key, value) in object {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten_into(row, Some(&name), inner),
            leaf => {
                row.insert(name, Cell::from_json(leaf));
            }
        }
    }
}

/// One row per entry of `items`, each tagged with the search identity and
/// the response's `regionCode`.
pub fn flatten_response(record: &SearchRecord, response: &Value) -> Result<Dataset, FlattenError> {
    let items = response
        .get("items")
        .ok_or(FlattenError::MissingField { field: "items" })?
        .as_array()
        .ok_or(FlattenError::WrongType {
            field: "items",
            expected: "array",
        })?;
    let region_code = response
        .get("regionCode")
        .ok_or(FlattenError::MissingField { field: "regionCode" })?;

    let mut data = Dataset::new();
    for (index, item) in items.iter().enumerate() {
        let object = item
            .as_object()
            .ok_or(FlattenError::ItemNotObject { index })?;
        data.push_row(flatten_object(object));
    }

    data.fill_column("timestamp", Cell::Timestamp(record.timestamp));
    data.fill_column("query", Cell::Text(record.query.clone()));
    data.fill_column("max_results", Cell::Int(i64::from(record.max_results)));
    data.fill_column("regionCode", Cell::from_json(region_code));
    Ok(data)
}

/// Flatten a single stored response, taking its identity from the file name.
pub fn flatten_one(path: impl AsRef<Path>) -> Result<Dataset, FlattenError> {
    let path = path.as_ref();
    let record = decode_filename(path).map_err(|source| FlattenError::Format {
        path: path.to_path_buf(),
        source,
    })?;
    let bytes = read_file(path)?;
    flatten_bytes(path, &record, &bytes)
}

fn read_file(path: &Path) -> Result<Vec<u8>, FlattenError> {
    fs::read(path).map_err(|source| FlattenError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn flatten_bytes(path: &Path, record: &SearchRecord, bytes: &[u8]) -> Result<Dataset, FlattenError> {
    let response: Value = serde_json::from_slice(bytes).map_err(|source| FlattenError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    flatten_response(record, &response).map_err(|err| err.in_file(path))
}

/// Stored response files in `dir`, sorted by name.
///
/// Only regular `.json` files count; the manifest and temporary files are skipped.
pub fn response_files(dir: &Path) -> Result<Vec<PathBuf>, FlattenError> {
    let io_err = |source| FlattenError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !entry.file_type().map_err(io_err)?.is_file() {
            debug!(path = %path.display(), "skipping non-file entry");
            continue;
        }
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(EXTENSION));
        if is_json {
            files.push(path);
        } else {
            debug!(file = %path.display(), "skipping non-json entry");
        }
    }
    files.sort();
    Ok(files)
}

/// Flattens every stored response in a directory into one dataset.
#[derive(Debug, Clone)]
pub struct Flattener {
    policy: ErrorPolicy,
    use_manifest: bool,
}

impl Default for Flattener {
    fn default() -> Self {
        Self::new()
    }
}

impl Flattener {
    pub fn new() -> Self {
        Self {
            policy: ErrorPolicy::Collect,
            use_manifest: true,
        }
    }

    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether to prefer `manifest.jsonl` metadata over decoding file names.
    pub fn with_manifest(mut self, use_manifest: bool) -> Self {
        self.use_manifest = use_manifest;
        self
    }

    pub fn flatten_all(&self, dir: impl AsRef<Path>) -> Result<FlattenReport, FlattenError> {
        let dir = dir.as_ref();
        let manifest = if self.use_manifest {
            Manifest::load(dir).unwrap_or_else(|err| {
                warn!(dir = %dir.display(), "ignoring unreadable manifest: {}", err);
                Manifest::default()
            })
        } else {
            Manifest::default()
        };

        let files = response_files(dir)?;
        let mut report = FlattenReport {
            files: files.len(),
            ..FlattenReport::default()
        };

        for path in files {
            match self.flatten_file(&manifest, &path) {
                Ok(data) => {
                    debug!(file = %path.display(), rows = data.len(), "flattened response");
                    report.dataset.append(data);
                }
                Err(err) if self.policy == ErrorPolicy::Abort => return Err(err),
                Err(err) => {
                    warn!(file = %path.display(), "skipping response: {}", err);
                    report.failures.push(FileFailure { path, error: err });
                }
            }
        }

        info!(
            dir = %dir.display(),
            files = report.files,
            rows = report.dataset.len(),
            failures = report.failures.len(),
            "flattened response directory"
        );
        Ok(report)
    }

    fn flatten_file(&self, manifest: &Manifest, path: &Path) -> Result<Dataset, FlattenError> {
        let bytes = read_file(path)?;
        let record = match manifest.record_for(path, &bytes) {
            Some(record) => record,
            None => decode_filename(path).map_err(|source| FlattenError::Format {
                path: path.to_path_buf(),
                source,
            })?,
        };
        flatten_bytes(path, &record, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn record() -> SearchRecord {
        let ts = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        SearchRecord::new(ts, "test song reaction", 10)
    }

    #[test]
    fn nested_objects_flatten_with_dots() {
        let item = json!({
            "kind": "youtube#searchResult",
            "id": {"kind": "youtube#video", "videoId": "abc"},
            "snippet": {
                "title": "T",
                "thumbnails": {"default": {"url": "u", "width": 120}},
                "tags": ["a", "b"],
                "empty": {}
            }
        });
        let row = flatten_object(item.as_object().unwrap());
        let keys: Vec<&str> = row.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "kind",
                "id.kind",
                "id.videoId",
                "snippet.title",
                "snippet.thumbnails.default.url",
                "snippet.thumbnails.default.width",
                "snippet.tags"
            ]
        );
        assert_eq!(row["snippet.thumbnails.default.width"], Cell::Int(120));
        assert_eq!(row["snippet.tags"], Cell::List(vec![json!("a"), json!("b")]));
    }

    #[test]
    fn metadata_columns_are_attached_to_every_row() {
        let response = json!({
            "regionCode": "BR",
            "items": [{"id": {"videoId": "a"}}, {"id": {"videoId": "b"}}]
        });
        let data = flatten_response(&record(), &response).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(
            data.columns().collect::<Vec<_>>(),
            vec!["id.videoId", "timestamp", "query", "max_results", "regionCode"]
        );
        for row in 0..2 {
            assert_eq!(data.get(row, "regionCode").as_str(), Some("BR"));
            assert_eq!(data.get(row, "max_results").as_i64(), Some(10));
            assert_eq!(data.get(row, "timestamp").as_timestamp(), Some(record().timestamp));
        }
    }

    #[test]
    fn empty_items_give_zero_rows() {
        let response = json!({"regionCode": "US", "items": []});
        let data = flatten_response(&record(), &response).unwrap();
        assert!(data.is_empty());
        assert!(data.has_column("query"));
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = flatten_response(&record(), &json!({"items": []})).unwrap_err();
        assert!(matches!(err, FlattenError::MissingField { field: "regionCode" }));

        let err = flatten_response(&record(), &json!({"regionCode": "US"})).unwrap_err();
        assert!(matches!(err, FlattenError::MissingField { field: "items" }));

        let err = flatten_response(&record(), &json!({"regionCode": "US", "items": {}})).unwrap_err();
        assert!(matches!(err, FlattenError::WrongType { field: "items", .. }));

        let err =
            flatten_response(&record(), &json!({"regionCode": "US", "items": [1]})).unwrap_err();
        assert!(matches!(err, FlattenError::ItemNotObject { index: 0 }));
    }
}
