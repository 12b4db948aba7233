use serde_json::Value;
use tracing::{debug, info};

use crate::errors::SearchError;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Self-describing type tag of a search response.
pub const KIND_LABEL: &str = "youtube#searchListResponse";

/// True only when the response's `kind` is exactly the search-list label.
pub fn is_valid_response(response: &Value) -> bool {
    response.get("kind").and_then(Value::as_str) == Some(KIND_LABEL)
}

/// Query text for "<song title> <expansion>", e.g. a song plus "reaction".
pub fn song_query(title: &str, expansion: &str) -> String {
    format!("{} {}", title, expansion).trim().to_lowercase()
}

pub struct YouTubeClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    /// One `search.list` call with `part=id,snippet`. Returns the raw response body.
    pub async fn search(&self, query: &str, max_results: u32) -> Result<Value, SearchError> {
        debug!(query, max_results, "search request");
        let max_results = max_results.to_string();
        let resp = self
            .client
            .get(self.endpoint())
            .query(&[
                ("part", "id,snippet"),
                ("q", query),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(SearchError::Api {
                status: status.as_u16(),
                message: api_error_message(&text),
            });
        }

        let json: Value = serde_json::from_str(&text)?;
        let items = json["items"].as_array().map(Vec::len).unwrap_or(0);
        info!(query, items, "search completed");
        Ok(json)
    }
}

/// `error.message` from a Google API error body, or the body itself.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn validity_requires_exact_kind() {
        assert!(is_valid_response(&json!({"kind": KIND_LABEL})));
        assert!(!is_valid_response(&json!({"kind": "youtube#searchListResponse "})));
        assert!(!is_valid_response(&json!({"kind": "youtube#videoListResponse"})));
        assert!(!is_valid_response(&json!({"kind": null})));
        assert!(!is_valid_response(&json!({"items": []})));
        assert!(!is_valid_response(&json!("youtube#searchListResponse")));
    }

    #[test]
    fn song_query_is_trimmed_and_lowercased() {
        assert_eq!(song_query("Canto das Tres Racas", "Reaction"), "canto das tres racas reaction");
        assert_eq!(song_query("Title", ""), "title");
    }

    #[test]
    fn error_message_prefers_api_payload() {
        let body = r#"{"error": {"code": 403, "message": "quota exceeded"}}"#;
        assert_eq!(api_error_message(body), "quota exceeded");
        assert_eq!(api_error_message(" bad gateway \n"), "bad gateway");
    }

    #[test]
    fn endpoint_joins_base_url() {
        let client = YouTubeClient::new("k").unwrap().with_base_url("http://localhost:9/v3/");
        assert_eq!(client.endpoint(), "http://localhost:9/v3/search");
    }
}
