//! Groq OpenAI-compatible chat completions backend.

use super::transport_error;
use crate::error::ProviderError;
use crate::http_client::HttpClient;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

const ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

pub(crate) async fn generate(
    http: &dyn HttpClient,
    model: &str,
    credential: &str,
    prompt: &str,
) -> Result<String, ProviderError> {
    let body = json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ]
    });
    let authorization = format!("Bearer {}", credential);

    debug!("POST {}", ENDPOINT);
    let response = http
        .post_json(
            ENDPOINT,
            &[
                ("Authorization", authorization.as_str()),
                ("Content-Type", "application/json"),
            ],
            &body,
        )
        .await
        .map_err(transport_error)?;
    debug!("Groq responded with HTTP {}", response.status);

    if !response.is_success() {
        return Err(ProviderError::Status {
            status: response.status,
            body: response.body,
        });
    }

    parse_response(&response.body)
}

fn parse_response(body: &str) -> Result<String, ProviderError> {
    let parsed: ChatCompletionResponse =
        serde_json::from_str(body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .ok_or(ProviderError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::tests::MockHttpClient;

    #[tokio::test]
    async fn test_request_shape() {
        let http = MockHttpClient::new(
            200,
            r#"{"choices":[{"message":{"role":"assistant","content":"git status"}}]}"#,
        );
        let text = generate(&http, "llama-test", "gsk_1", "show changes").await.unwrap();
        assert_eq!(text, "git status");

        let request = http.last_request().unwrap();
        assert_eq!(request.url, ENDPOINT);
        assert!(
            request
                .headers
                .contains(&("Authorization".to_string(), "Bearer gsk_1".to_string()))
        );
        assert_eq!(request.body["model"], "llama-test");
        assert_eq!(request.body["messages"][0]["role"], "user");
        assert_eq!(request.body["messages"][0]["content"], "show changes");
    }

    #[tokio::test]
    async fn test_unauthorized_status() {
        let http = MockHttpClient::new(401, r#"{"error":{"code":"invalid_api_key"}}"#);
        let err = generate(&http, DEFAULT_MODEL, "bad", "p").await.unwrap_err();
        assert!(matches!(err, ProviderError::Status { status: 401, .. }));
    }

    #[test]
    fn test_missing_choices() {
        assert_eq!(parse_response("{}"), Err(ProviderError::EmptyResponse));
        assert_eq!(
            parse_response(r#"{"choices":[]}"#),
            Err(ProviderError::EmptyResponse)
        );
    }
}
