pub mod manifest;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::codec::SearchRecord;
use crate::errors::StoreError;

use manifest::{append_entry, content_hash, ManifestEntry};

/// Where a response ended up.
#[derive(Debug, Clone)]
pub struct StoredResponse {
    pub path: PathBuf,
    pub record: SearchRecord,
    pub content_hash: String,
}

/// Directory of raw search responses plus their manifest.
pub struct ResponseStore {
    dir: PathBuf,
}

impl ResponseStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist a response stamped with the current local time.
    pub fn persist(
        &self,
        query: &str,
        max_results: u32,
        response: &Value,
        valid: bool,
    ) -> Result<StoredResponse, StoreError> {
        let record = SearchRecord::new(now_seconds(), query, max_results);
        self.persist_record(&record, response, valid)
    }

    /// Write `response` under the file name derived from `record`.
    ///
    /// The manifest entry keeps `record.query` as given, including any `-` or `_`
    /// the file name cannot carry.
    ///
    /// The file is written beside its final name and renamed into place.
    pub fn persist_record(
        &self,
        record: &SearchRecord,
        response: &Value,
        valid: bool,
    ) -> Result<StoredResponse, StoreError> {
        let file = record.file_name();
        let path = self.dir.join(&file);
        let bytes = to_indented_json(response)?;

        if path.exists() {
            warn!(file = %file, "overwriting stored response from the same second");
        }

        let tmp = self.dir.join(format!("{file}.tmp"));
        fs::write(&tmp, &bytes).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        let hash = content_hash(&bytes);
        append_entry(
            &self.dir,
            &ManifestEntry {
                file: file.clone(),
                timestamp: record.timestamp,
                query: record.query.clone(),
                max_results: record.max_results,
                content_hash: hash.clone(),
                valid,
            },
        )?;
        debug!(file = %file, size = bytes.len(), "manifest entry appended");
        info!(path = %path.display(), "JSON response written");

        Ok(StoredResponse {
            path,
            record: record.clone(),
            content_hash: hash,
        })
    }
}

/// Local wall-clock time truncated to whole seconds, matching the file name precision.
fn now_seconds() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

fn to_indented_json(value: &Value) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser)?;
    Ok(out)
}
