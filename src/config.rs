use std::fmt;
use std::fs;
use std::path::PathBuf;

use crate::errors::ConfigError;

pub const DEFAULT_API_KEY_FILE: &str = "apikey.txt";
pub const DEFAULT_OUTPUT_DIR: &str = "response";
pub const DEFAULT_MAX_RESULTS: u32 = 10;

/// Where the YouTube Data API key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// A file whose trimmed contents are the key.
    File(PathBuf),
    /// An environment variable holding the key.
    Env(String),
    /// The key itself.
    Inline(String),
}

impl Default for ApiKeySource {
    fn default() -> Self {
        ApiKeySource::File(PathBuf::from(DEFAULT_API_KEY_FILE))
    }
}

impl fmt::Display for ApiKeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiKeySource::File(path) => write!(f, "file '{}'", path.display()),
            ApiKeySource::Env(var) => write!(f, "environment variable '{var}'"),
            ApiKeySource::Inline(_) => write!(f, "inline value"),
        }
    }
}

impl ApiKeySource {
    /// Read the key, failing on a missing source or an empty key.
    pub fn resolve(&self) -> Result<String, ConfigError> {
        let raw = match self {
            ApiKeySource::File(path) => {
                fs::read_to_string(path).map_err(|source| ConfigError::KeyFile {
                    path: path.clone(),
                    source,
                })?
            }
            ApiKeySource::Env(var) => {
                dotenv::var(var).map_err(|_| ConfigError::KeyEnv(var.clone()))?
            }
            ApiKeySource::Inline(key) => key.clone(),
        };
        let key = raw.trim();
        if key.is_empty() {
            return Err(ConfigError::EmptyKey(self.to_string()));
        }
        Ok(key.to_string())
    }
}

/// Options for the search and store side of the tool.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub api_key_source: ApiKeySource,
    /// Directory receiving one JSON file per search.
    pub output_dir: PathBuf,
    /// Persist responses even when they fail the kind-label check.
    pub write_always: bool,
    pub max_results: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_source: ApiKeySource::default(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            write_always: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl SearchConfig {
    /// Defaults overridden by `YTSEARCH_*` variables.
    ///
    /// `dotenv::var` loads `.env` on first use, so library callers get it too.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| dotenv::var(key).ok())
    }

    pub(crate) fn from_vars(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if get("YTSEARCH_API_KEY").is_some_and(|v| !v.trim().is_empty()) {
            cfg.api_key_source = ApiKeySource::Env("YTSEARCH_API_KEY".to_string());
        } else if let Some(path) = non_empty(get("YTSEARCH_API_KEY_FILE")) {
            cfg.api_key_source = ApiKeySource::File(PathBuf::from(path));
        }
        if let Some(dir) = non_empty(get("YTSEARCH_OUTPUT_DIR")) {
            cfg.output_dir = PathBuf::from(dir);
        }
        if let Some(value) = non_empty(get("YTSEARCH_WRITE_ALWAYS")) {
            cfg.write_always = parse_bool("YTSEARCH_WRITE_ALWAYS", &value)?;
        }
        if let Some(value) = non_empty(get("YTSEARCH_MAX_RESULTS")) {
            cfg.max_results = value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "YTSEARCH_MAX_RESULTS",
                value: value.clone(),
            })?;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let cfg = SearchConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(cfg.api_key_source, ApiKeySource::File(PathBuf::from("apikey.txt")));
        assert_eq!(cfg.output_dir, PathBuf::from("response"));
        assert!(!cfg.write_always);
        assert_eq!(cfg.max_results, 10);
    }

    #[test]
    fn variables_override_defaults() {
        let cfg = SearchConfig::from_vars(vars(&[
            ("YTSEARCH_API_KEY_FILE", "/etc/yt/key"),
            ("YTSEARCH_OUTPUT_DIR", "out"),
            ("YTSEARCH_WRITE_ALWAYS", "Yes"),
            ("YTSEARCH_MAX_RESULTS", "50"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_key_source, ApiKeySource::File(PathBuf::from("/etc/yt/key")));
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert!(cfg.write_always);
        assert_eq!(cfg.max_results, 50);
    }

    #[test]
    fn inline_key_variable_wins_over_key_file() {
        let cfg = SearchConfig::from_vars(vars(&[
            ("YTSEARCH_API_KEY", "abc"),
            ("YTSEARCH_API_KEY_FILE", "key.txt"),
        ]))
        .unwrap();
        assert_eq!(cfg.api_key_source, ApiKeySource::Env("YTSEARCH_API_KEY".into()));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            SearchConfig::from_vars(vars(&[("YTSEARCH_MAX_RESULTS", "0")])),
            Err(ConfigError::ZeroMaxResults)
        ));
        assert!(matches!(
            SearchConfig::from_vars(vars(&[("YTSEARCH_MAX_RESULTS", "many")])),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(matches!(
            SearchConfig::from_vars(vars(&[("YTSEARCH_WRITE_ALWAYS", "maybe")])),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn key_file_is_trimmed() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("apikey.txt");
        fs::write(&path, "  secret-key\n").unwrap();
        assert_eq!(ApiKeySource::File(path).resolve().unwrap(), "secret-key");
    }

    #[test]
    fn missing_or_empty_key_fails_fast() {
        let temp = tempdir().unwrap();
        let missing = ApiKeySource::File(temp.path().join("nope.txt"));
        assert!(matches!(missing.resolve(), Err(ConfigError::KeyFile { .. })));

        let empty = temp.path().join("empty.txt");
        fs::write(&empty, "\n").unwrap();
        assert!(matches!(
            ApiKeySource::File(empty).resolve(),
            Err(ConfigError::EmptyKey(_))
        ));
        assert!(matches!(
            ApiKeySource::Inline("   ".into()).resolve(),
            Err(ConfigError::EmptyKey(_))
        ));
        assert!(matches!(
            ApiKeySource::Env("YTSEARCH_TEST_UNSET_KEY_VAR".into()).resolve(),
            Err(ConfigError::KeyEnv(_))
        ));
    }
}
