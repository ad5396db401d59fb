use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

/// Client for the external natural-language intent parser.
///
/// The parser owns all language understanding; this side only ships the
/// user's prose and hands back the structured intent JSON for the caller to
/// decode. Parsing failures never mutate any room state.
pub struct IntentParserClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ParseRequest<'a> {
    text: &'a str,
    /// "YYYY-MM-DD" anchor for relative phrases like "다음 주".
    today: &'a str,
}

impl IntentParserClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client, base_url }
    }

    /// Send prose to the parser, returning the raw intent JSON.
    pub async fn parse(&self, text: &str, today: &str) -> Result<Value, ParserError> {
        let url = format!("{}/parse", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&ParseRequest { text, today })
            .send()
            .await
            .map_err(|e| ParserError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ParserError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| ParserError::Parse(e.to_string()))
    }
}

/// Errors from the intent parser service.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    #[error("Request error: {0}")]
    Request(String),
    #[error("Parser error: {0}")]
    Api(String),
    #[error("Parse error: {0}")]
    Parse(String),
}
