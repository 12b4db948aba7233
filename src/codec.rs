use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::errors::FormatError;

/// Timestamp layout used as the first segment of a stored file name.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Separates the timestamp, query and max_results segments.
pub const DELIMITER: char = '-';
pub const EXTENSION: &str = "json";

const FALLBACK_NAME: &str = "untitled";

/// Identity of one search call: when it ran, what was asked, how many results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub timestamp: NaiveDateTime,
    pub query: String,
    pub max_results: u32,
}

impl SearchRecord {
    pub fn new(timestamp: NaiveDateTime, query: impl Into<String>, max_results: u32) -> Self {
        Self {
            timestamp,
            query: query.into(),
            max_results,
        }
    }

    /// Stored file name. The query goes through [`stored_identifier`] first, so
    /// `-` and `_` in the query cannot break decoding.
    pub fn file_name(&self) -> String {
        encode_filename(&stored_identifier(&self.query), self.max_results, self.timestamp)
    }
}

/// Query as carried in a file name: `-` and `_` become spaces.
pub fn stored_identifier(query: &str) -> String {
    query.replace([DELIMITER, '_'], " ")
}

/// Build the stored file name for a search.
///
/// The query must not contain `-`, otherwise [`decode_filename`] cannot split
/// the name back into its three segments.
pub fn encode_filename(query: &str, max_results: u32, timestamp: NaiveDateTime) -> String {
    let stem = format!(
        "{}{DELIMITER}{}{DELIMITER}{}",
        timestamp.format(TIMESTAMP_FORMAT),
        query.replace(' ', "_"),
        max_results
    );
    format!("{}.{}", sanitize_filename(&stem), EXTENSION)
}

/// Restrict a string to characters that are safe in a path component.
///
/// Anything outside `-_.() a-zA-Z0-9` becomes `_`, runs of `_` collapse into
/// one, and an empty result becomes `untitled`.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if is_safe_char(c) { c } else { '_' })
        .collect();
    let collapsed = cleaned
        .trim()
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    if collapsed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        collapsed
    }
}

fn is_safe_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '(' | ')' | ' ')
}

/// Recover the search identity from a stored file name or path.
///
/// Underscores in the query segment come back as spaces, so a query that
/// originally held `_` is not recovered byte for byte.
pub fn decode_filename(name: impl AsRef<Path>) -> Result<SearchRecord, FormatError> {
    let path = name.as_ref();
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| FormatError::NoFileName(path.to_path_buf()))?;

    let parts: Vec<&str> = file_name.split(DELIMITER).collect();
    let [timestamp_part, query_part, number_part] = parts.as_slice() else {
        return Err(FormatError::PartCount {
            name: file_name.to_string(),
            parts: parts.len(),
        });
    };

    let timestamp = NaiveDateTime::parse_from_str(timestamp_part, TIMESTAMP_FORMAT).map_err(
        |source| FormatError::Timestamp {
            value: timestamp_part.to_string(),
            source,
        },
    )?;

    let number = number_part.split('.').next().unwrap_or(*number_part);
    let max_results = number
        .parse::<u32>()
        .map_err(|source| FormatError::MaxResults {
            value: number.to_string(),
            source,
        })?;

    Ok(SearchRecord {
        timestamp,
        query: query_part.replace('_', " "),
        max_results,
    })
}
