/// LLM Client: the single point of entry for calls to the generative-language API.
///
/// No other module talks to the remote endpoint directly. Requests use the
/// `generateContent` JSON shape; the endpoint URL and credential come from
/// configuration. One attempt per call: failures are reported, never retried.
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GENAI_API_KEY is not configured")]
    Configuration,

    #[error("{0}")]
    Network(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Upstream { status: u16, message: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedResponse(String),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    system_instruction: Content<'a>,
    tools: Vec<Tool>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first part of the first candidate, if non-empty.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: Option<String>,
}

impl LlmClient {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_url,
            api_key,
        })
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one `generateContent` request and returns the first candidate's text.
    pub async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::Configuration)?;

        let request_body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            system_instruction: Content {
                parts: vec![Part { text: system }],
            },
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .header(API_KEY_HEADER, api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("GenAI API returned {}: {}", status, body);
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(LlmError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| LlmError::UnexpectedResponse(e.to_string()))?;

        let text = parsed
            .text()
            .ok_or_else(|| LlmError::UnexpectedResponse("no candidate text".to_string()))?;

        debug!(chars = text.len(), "GenAI call succeeded");
        Ok(text.to_string())
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::Value;

    /// Serves `status` + `body` for every POST on an ephemeral local port and
    /// returns the URL to call.
    pub async fn spawn_stub(status: StatusCode, body: Value) -> String {
        let app = Router::new().route(
            "/generate",
            post(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/generate")
    }

    pub fn candidate_body(text: &str) -> Value {
        serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] } }]
        })
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use super::stub::{candidate_body, spawn_stub};
    use super::*;

    fn client(url: String, key: Option<&str>) -> LlmClient {
        LlmClient::new(url, key.map(String::from), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_request_body_shape() {
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: "user" }],
            }],
            system_instruction: Content {
                parts: vec![Part { text: "system" }],
            },
            tools: vec![Tool {
                google_search: serde_json::Map::new(),
            }],
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["contents"][0]["parts"][0]["text"], "user");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "system");
        assert_eq!(value["tools"][0]["google_search"], json!({}));
    }

    #[test]
    fn test_response_text_extraction() {
        let parsed: GenerateContentResponse =
            serde_json::from_value(candidate_body("Analysis")).unwrap();
        assert_eq!(parsed.text(), Some("Analysis"));

        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.text(), None);

        let no_parts: GenerateContentResponse =
            serde_json::from_value(json!({"candidates": [{"content": {}}]})).unwrap();
        assert_eq!(no_parts.text(), None);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_network() {
        // Unroutable URL: reaching the network would be a Network error instead.
        let llm = client("http://127.0.0.1:1/never".to_string(), None);
        assert!(matches!(
            llm.generate("p", "s").await,
            Err(LlmError::Configuration)
        ));
    }

    #[tokio::test]
    async fn test_success_returns_first_candidate_text() {
        let url = spawn_stub(StatusCode::OK, candidate_body("Analysis\nStrengths:")).await;
        let text = client(url, Some("key")).generate("p", "s").await.unwrap();
        assert_eq!(text, "Analysis\nStrengths:");
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let url = spawn_stub(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "API key not valid"}}),
        )
        .await;
        match client(url, Some("bad")).generate("p", "s").await {
            Err(LlmError::Upstream { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unexpected_shape() {
        let url = spawn_stub(StatusCode::OK, json!({"promptFeedback": {}})).await;
        assert!(matches!(
            client(url, Some("key")).generate("p", "s").await,
            Err(LlmError::UnexpectedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let llm = client(format!("http://{addr}/generate"), Some("key"));
        assert!(matches!(
            llm.generate("p", "s").await,
            Err(LlmError::Network(_))
        ));
    }
}
