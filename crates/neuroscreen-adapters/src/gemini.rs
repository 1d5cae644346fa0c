//! Gemini `generateContent` client for the assistant chat.

use std::time::Duration;

use anyhow::{Context, Result};
use neuroscreen_core::chat::{validate_message, ChatError, PERSONA};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default public API endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// Default model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Instruction<'a> {
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct Turn<'a> {
    role: &'static str,
    parts: [TextPart<'a>; 1],
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    system_instruction: Instruction<'a>,
    contents: [Turn<'a>; 1],
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate.
    fn text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

/// Stateless single-turn chat client.
///
/// Every call sends the [`PERSONA`] as system instruction and the user's
/// message as the only turn. There is no history and no retry.
#[derive(Debug, Clone)]
pub struct GeminiChat {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl GeminiChat {
    /// Creates a client for `model` served from `api_base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        api_base: &str,
        model: &str,
        api_key: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/v1beta/models/{model}:generateContent",
                api_base.trim_end_matches('/')
            ),
            api_key: api_key.into(),
        })
    }

    /// Full URL requests are sent to.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Sends `message` and returns the model's reply text.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::EmptyMessage`] for blank input and
    /// [`ChatError::Upstream`] if the request fails, the service answers with
    /// a non-success status or the response carries no text.
    pub async fn reply(&self, message: &str) -> Result<String, ChatError> {
        let message = validate_message(message)?;

        let body = GenerateRequest {
            system_instruction: Instruction {
                parts: [TextPart { text: PERSONA }],
            },
            contents: [Turn {
                role: "user",
                parts: [TextPart { text: message }],
            }],
        };

        debug!(endpoint = %self.endpoint, chars = message.len(), "Sending chat request");
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(upstream(format!("status {status}: {text}")));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| upstream(format!("invalid response: {e}")))?;

        parsed
            .text()
            .ok_or_else(|| upstream("response contained no text".to_string()))
    }
}

const fn upstream(detail: String) -> ChatError {
    ChatError::Upstream(detail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_format() {
        let chat = GeminiChat::new("http://localhost:9/", "gemini-1.5-flash", "k", None)
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            chat.endpoint(),
            "http://localhost:9/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_request_shape() {
        let body = GenerateRequest {
            system_instruction: Instruction {
                parts: [TextPart { text: "persona" }],
            },
            contents: [Turn {
                role: "user",
                parts: [TextPart { text: "hi" }],
            }],
        };
        let json = serde_json::to_value(&body).unwrap_or_default();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "persona");
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"there."}]}}]}"#;
        let parsed: GenerateResponse =
            serde_json::from_str(raw).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parsed.text().as_deref(), Some("Hello, there."));
    }

    #[test]
    fn test_response_without_text() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[]}"#).unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(parsed.text(), None);
    }
}
