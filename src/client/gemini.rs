//! Production [`GenerativeBackend`] speaking the Gemini REST API.
//!
//! Two endpoints of `generativelanguage.googleapis.com/v1beta` are used:
//!
//! * `GET  /models/{model}?key=…` — credential/model validation (bind probe)
//! * `POST /models/{model}:generateContent?key=…` — one completion over the
//!   conversation so far
//!
//! The credential travels as the `key` query parameter, matching the
//! service's API-key auth scheme. URLs therefore contain the secret and must
//! never be logged; log lines carry the model name and a masked key only.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::{GenerativeBackend, KeyPool, Turn};
use crate::error::{Pdf2JsonError, ServiceError};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Longest error-body snippet carried into [`ServiceError::Status`].
const BODY_SNIPPET_LEN: usize = 300;

/// HTTP client for the Gemini generative-language service.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    timeout_secs: u64,
}

impl GeminiClient {
    /// Build a client with a per-request deadline.
    pub fn new(timeout_secs: u64) -> Result<Self, Pdf2JsonError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Pdf2JsonError::Internal(format!("HTTP client init failed: {e}")))?;
        Ok(Self {
            http,
            base_url: GEMINI_BASE_URL.to_string(),
            timeout_secs,
        })
    }

    /// Point the client at a different host (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn model_url(&self, model: &str, credential: &str) -> String {
        format!("{}/models/{}?key={}", self.base_url, model, credential)
    }

    fn generate_url(&self, model: &str, credential: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, credential
        )
    }

    fn map_send_error(&self, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout {
                secs: self.timeout_secs,
            }
        } else {
            ServiceError::Network {
                detail: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl GenerativeBackend for GeminiClient {
    async fn probe(&self, credential: &str, model: &str) -> Result<(), ServiceError> {
        debug!(model, key = %KeyPool::mask(credential), "probing model");
        let response = self
            .http
            .get(self.model_url(model, credential))
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                code: status.as_u16(),
                body: snippet(&body),
            });
        }
        Ok(())
    }

    async fn generate(
        &self,
        credential: &str,
        model: &str,
        turns: &[Turn],
    ) -> Result<String, ServiceError> {
        debug!(
            model,
            key = %KeyPool::mask(credential),
            turns = turns.len(),
            "sending generateContent"
        );
        let request = GenerateRequest {
            contents: turns
                .iter()
                .map(|t| WireContent {
                    role: t.role.as_str(),
                    parts: vec![WirePart { text: &t.text }],
                })
                .collect(),
        };

        let response = self
            .http
            .post(self.generate_url(model, credential))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                code: status.as_u16(),
                body: snippet(&body),
            });
        }

        let body: GenerateResponse =
            response.json().await.map_err(|e| ServiceError::Malformed {
                detail: e.to_string(),
            })?;
        first_text(body).ok_or(ServiceError::EmptyResponse)
    }
}

/// Dig the first candidate's first text part out of a response body.
fn first_text(body: GenerateResponse) -> Option<String> {
    body.candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .find_map(|p| p.text)
        .filter(|t| !t.is_empty())
}

fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.len() <= BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut end = BODY_SNIPPET_LEN;
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &trimmed[..end])
}

// ── Wire types ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<WireContent<'a>>,
}

#[derive(Debug, Serialize)]
struct WireContent<'a> {
    role: &'a str,
    parts: Vec<WirePart<'a>>,
}

#[derive(Debug, Serialize)]
struct WirePart<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Role;

    fn client() -> GeminiClient {
        GeminiClient::new(30).unwrap()
    }

    #[test]
    fn urls_carry_model_and_key() {
        let c = client();
        assert_eq!(
            c.model_url("gemini-2.5-flash", "SECRET"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash?key=SECRET"
        );
        let gen = c.generate_url("gemini-2.5-flash", "SECRET");
        assert!(gen.contains(":generateContent?key=SECRET"));
    }

    #[test]
    fn base_url_override() {
        let c = client().with_base_url("http://localhost:9999/v1beta");
        assert!(c.model_url("m", "k").starts_with("http://localhost:9999/v1beta/models/m"));
    }

    #[test]
    fn request_serialises_roles_and_parts() {
        let turns = vec![Turn::user("hello"), Turn::model("hi")];
        let request = GenerateRequest {
            contents: turns
                .iter()
                .map(|t| WireContent {
                    role: t.role.as_str(),
                    parts: vec![WirePart { text: &t.text }],
                })
                .collect(),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(json["contents"][1]["role"], "model");
    }

    #[test]
    fn digs_first_candidate_text() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{
                "candidates": [
                    {"content": {"parts": [{"text": "{\"a\": 1}"}], "role": "model"}}
                ],
                "usageMetadata": {"promptTokenCount": 10}
            }"#,
        )
        .unwrap();
        assert_eq!(first_text(body).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn empty_candidates_yield_none() {
        let body: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        assert!(first_text(body).is_none());

        let body: GenerateResponse = serde_json::from_str(r#"{}"#).unwrap();
        assert!(first_text(body).is_none());
    }

    #[test]
    fn blank_text_counts_as_empty() {
        let body: GenerateResponse = serde_json::from_str(
            r#"{"candidates": [{"content": {"parts": [{"text": ""}]}}]}"#,
        )
        .unwrap();
        assert!(first_text(body).is_none());
    }

    #[test]
    fn snippet_truncates_long_bodies() {
        let long = "x".repeat(BODY_SNIPPET_LEN * 2);
        let s = snippet(&long);
        assert!(s.chars().count() <= BODY_SNIPPET_LEN + 1);
        assert!(s.ends_with('…'));
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn role_wire_names() {
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Model.as_str(), "model");
    }
}
