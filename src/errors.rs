use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A stored file name that does not follow `<timestamp>-<query>-<max_results>.json`.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("file name '{name}' has {parts} '-'-separated parts, expected 3")]
    PartCount { name: String, parts: usize },
    #[error("invalid timestamp '{value}' in file name: {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("invalid max_results '{value}' in file name: {source}")]
    MaxResults {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("path '{}' has no usable file name", .0.display())]
    NoFileName(PathBuf),
}

/// Failure while turning a stored response into rows.
#[derive(Debug, Error)]
pub enum FlattenError {
    #[error("cannot decode {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },
    #[error("failed reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("response is missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("field '{field}' has the wrong type, expected {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("items[{index}] is not a JSON object")]
    ItemNotObject { index: usize },
    #[error("{}: {source}", .path.display())]
    InFile {
        path: PathBuf,
        #[source]
        source: Box<FlattenError>,
    },
}

impl FlattenError {
    /// Attach the offending file to a content-level error.
    pub(crate) fn in_file(self, path: impl Into<PathBuf>) -> Self {
        match self {
            err @ (Self::MissingField { .. } | Self::WrongType { .. } | Self::ItemNotObject { .. }) => {
                Self::InFile {
                    path: path.into(),
                    source: Box::new(err),
                }
            }
            other => other,
        }
    }
}

/// Failure resolving startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key file '{}' could not be read: {source}", .path.display())]
    KeyFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("environment variable '{0}' holding the API key is not set")]
    KeyEnv(String),
    #[error("API key from {0} is empty")]
    EmptyKey(String),
    #[error("max_results must be positive")]
    ZeroMaxResults,
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failure talking to the search API.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("HTTP error {status} from search API: {message}")]
    Api { status: u16, message: String },
    #[error("search request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("search API returned a non-JSON body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Anything that can stop a search-and-store run.
#[derive(Debug, Error)]
pub enum SearcherError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure persisting a response or its manifest entry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed for {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to serialize: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Failure writing the columnar dataset.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("dataset has no columns to export")]
    Empty,
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("parquet write failed: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("failed to encode cell: {0}")]
    Encode(#[from] serde_json::Error),
}
