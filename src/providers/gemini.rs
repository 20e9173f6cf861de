//! Google Gemini `generateContent` backend.

use super::transport_error;
use crate::error::ProviderError;
use crate::http_client::HttpClient;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

fn endpoint(model: &str) -> String {
    format!("{}/{}:generateContent", BASE_URL, model)
}

pub(crate) async fn generate(
    http: &dyn HttpClient,
    model: &str,
    credential: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let url = format!("{}?key={}", endpoint(model), credential);
    let body = json!({
        "contents": [
            { "parts": [ { "text": prompt } ] }
        ]
    });

    debug!("POST {}?key=<redacted>", endpoint(model));
    let response = http
        .post_json(&url, &[("Content-Type", "application/json")], &body)
        .await
        .map_err(transport_error)?;
    debug!("Gemini responded with HTTP {}", response.status);

    if !response.is_success() {
        return Err(ProviderError::Status {
            status: response.status,
            body: response.body,
        });
    }

    parse_response(&response.body)
}

fn parse_response(body: &str) -> Result<String, ProviderError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ProviderError::EmptyResponse)
}
