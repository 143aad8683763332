//! Gemini `generateContent` driver.
//!
//! Sends a single-turn prompt with `responseMimeType: application/json` and
//! the caller's schema, and returns the concatenated text of the first
//! candidate.

use std::time::Duration;

use serde::Deserialize;

use super::{CompletionError, CompletionService, CompletionSettings, SchemaDescriptor};

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

/// Driver for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    settings: CompletionSettings,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("settings", &self.settings)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client. The settings carry the already-validated API key.
    pub fn new(settings: CompletionSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self { http, settings })
    }

    /// `{base}/v1beta/models/{model}:generateContent`
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.model
        )
    }

    fn request_body(prompt: &str, schema: &SchemaDescriptor) -> serde_json::Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema.to_wire()
            }
        })
    }
}

#[async_trait::async_trait]
impl CompletionService for GeminiClient {
    async fn complete_text(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<String, CompletionError> {
        let url = self.endpoint();
        let body = Self::request_body(prompt, schema);

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::ServiceUnavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.json::<ErrorEnvelope>().await {
                Ok(env) => format!("{} {}: {}", status.as_u16(), env.error.status, env.error.message),
                Err(_) => status.to_string(),
            };
            return Err(CompletionError::ServiceUnavailable(detail));
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| CompletionError::ServiceUnavailable(format!("unreadable envelope: {e}")))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(CompletionError::ServiceUnavailable(
                "no candidates returned".to_string(),
            ));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(CompletionError::ServiceUnavailable(format!(
                "empty candidate (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }

        tracing::debug!(
            name: "completion.response",
            model = %self.settings.model,
            length = text.len(),
            "Completion text received"
        );
        Ok(text)
    }
}
