use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::codec::SearchRecord;
use crate::errors::StoreError;

pub const MANIFEST_FILE: &str = "manifest.jsonl";

/// Sidecar record for one persisted response.
///
/// Holds the exact query, which the file name can only carry sanitized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub file: String,
    pub timestamp: NaiveDateTime,
    pub query: String,
    pub max_results: u32,
    /// blake3 hex digest of the file contents as written.
    pub content_hash: String,
    /// Whether the response passed the kind-label check.
    pub valid: bool,
}

impl ManifestEntry {
    pub fn record(&self) -> SearchRecord {
        SearchRecord::new(self.timestamp, self.query.clone(), self.max_results)
    }
}

pub fn content_hash(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// Latest manifest entry per file name.
#[derive(Debug, Default)]
pub struct Manifest {
    entries: HashMap<String, ManifestEntry>,
}

impl Manifest {
    /// Read `manifest.jsonl` from `dir`. A missing manifest is empty.
    pub fn load(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(MANIFEST_FILE);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let mut entries = HashMap::new();
        for (i, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<ManifestEntry>(line) {
                // Later lines describe later writes of the same name.
                Ok(entry) => {
                    entries.insert(entry.file.clone(), entry);
                }
                Err(e) => warn!(line = i + 1, "skipping malformed manifest entry: {}", e),
            }
        }
        debug!(entries = entries.len(), "manifest loaded");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, file: &str) -> Option<&ManifestEntry> {
        self.entries.get(file)
    }

    /// Identity for `path` when the manifest describes exactly these bytes.
    pub fn record_for(&self, path: &Path, bytes: &[u8]) -> Option<SearchRecord> {
        let name = path.file_name()?.to_str()?;
        let entry = self.entries.get(name)?;
        if entry.content_hash != content_hash(bytes) {
            warn!(file = name, "manifest hash mismatch, falling back to file name");
            return None;
        }
        Some(entry.record())
    }
}

/// Append one entry to the manifest in `dir`.
pub fn append_entry(dir: &Path, entry: &ManifestEntry) -> Result<(), StoreError> {
    let path = dir.join(MANIFEST_FILE);
    let mut line = serde_json::to_string(entry)?;
    line.push('\n');
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;
    file.write_all(line.as_bytes())
        .map_err(|source| StoreError::Io { path, source })
}
