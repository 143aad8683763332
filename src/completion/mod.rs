//! Structured completions from a generative text service.
//!
//! The [`CompletionService`] trait sends one prompt plus a
//! [`SchemaDescriptor`] and returns the raw response text. [`complete`]
//! builds on it: it parses the text as JSON, checks the top-level shape
//! against the schema and deserializes into the caller's type.
//!
//! # Drivers
//!
//! - [`GeminiClient`]: Gemini `generateContent` REST API
//!
//! # Example
//!
//! ```rust,ignore
//! use dev_toolbox::completion::{complete, prompts};
//!
//! let task = prompts::parse_user_agent(ua);
//! let parsed = complete::<prompts::UaBreakdown>(&*service, &task.prompt, &task.schema).await?;
//! println!("{}", parsed.value.browser);
//! ```

pub mod gemini;
pub mod prompts;
pub mod schema;

pub use gemini::GeminiClient;
pub use schema::{FieldKind, SchemaDescriptor};

use serde::de::DeserializeOwned;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default API base URL.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Connection settings for the completion service.
///
/// Loaded once at startup; the API key is mandatory.
#[derive(Clone)]
pub struct CompletionSettings {
    /// Base URL for the API (e.g., `https://generativelanguage.googleapis.com`).
    pub base_url: String,
    /// Access credential.
    pub api_key: String,
    /// Model identifier (e.g., `gemini-2.5-flash`).
    pub model: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl std::fmt::Debug for CompletionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Errors from a completion request.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CompletionError {
    /// The call raised, returned a non-success status, or produced no text.
    #[error("completion service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The text was not JSON of the requested shape.
    #[error("malformed completion response: {0}")]
    MalformedResponse(String),
}

/// A schema-checked structured response.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResult<T> {
    /// Typed value.
    pub value: T,
    /// Response text as returned by the service.
    pub raw: String,
}

/// Sends one prompt with a response schema and returns the response text.
#[async_trait::async_trait]
pub trait CompletionService: Send + Sync + std::fmt::Debug {
    /// Issue exactly one request. No retry, no caching.
    async fn complete_text(
        &self,
        prompt: &str,
        schema: &SchemaDescriptor,
    ) -> Result<String, CompletionError>;
}

/// Run a structured completion and decode it as `T`.
///
/// The response must parse as JSON and pass [`SchemaDescriptor::check`]
/// before it is deserialized; anything else is a
/// [`CompletionError::MalformedResponse`].
pub async fn complete<T: DeserializeOwned>(
    service: &dyn CompletionService,
    prompt: &str,
    schema: &SchemaDescriptor,
) -> Result<CompletionResult<T>, CompletionError> {
    let raw = service.complete_text(prompt, schema).await?;
    let value = decode(raw.trim(), schema).inspect_err(|e| {
        tracing::debug!(name: "completion.decode.failed", error = %e, raw = %raw, "Response rejected");
    })?;
    tracing::trace!(name: "completion.decode.ok", raw = %raw, "Response decoded");
    Ok(CompletionResult { value, raw })
}

/// Parse, shape-check and deserialize a response body.
pub fn decode<T: DeserializeOwned>(text: &str, schema: &SchemaDescriptor) -> Result<T, CompletionError> {
    let json: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| CompletionError::MalformedResponse(format!("not JSON: {e}")))?;

    schema
        .check(&json)
        .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

    serde_json::from_value(json).map_err(|e| CompletionError::MalformedResponse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Score {
        score: f64,
        analysis: String,
    }

    fn score_schema() -> SchemaDescriptor {
        SchemaDescriptor::object()
            .bare_field("score", FieldKind::Number)
            .bare_field("analysis", FieldKind::String)
    }

    #[derive(Debug)]
    struct Canned(Result<String, CompletionError>);

    #[async_trait::async_trait]
    impl CompletionService for Canned {
        async fn complete_text(
            &self,
            _prompt: &str,
            _schema: &SchemaDescriptor,
        ) -> Result<String, CompletionError> {
            self.0.clone()
        }
    }

    #[tokio::test]
    async fn test_complete_decodes_trimmed_text() {
        let svc = Canned(Ok("\n {\"score\": 12, \"analysis\": \"residential\"}\n".to_string()));
        let out = complete::<Score>(&svc, "p", &score_schema()).await.unwrap();
        assert_eq!(
            out.value,
            Score {
                score: 12.0,
                analysis: "residential".to_string()
            }
        );
        assert!(out.raw.contains("residential"));
    }

    #[tokio::test]
    async fn test_complete_rejects_non_json() {
        let svc = Canned(Ok("Sure! Here is the JSON".to_string()));
        let err = complete::<Score>(&svc, "p", &score_schema()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_rejects_wrong_shape() {
        let svc = Canned(Ok(r#"{"score": "high", "analysis": "x"}"#.to_string()));
        let err = complete::<Score>(&svc, "p", &score_schema()).await.unwrap_err();
        assert!(matches!(err, CompletionError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_complete_passes_through_service_error() {
        let svc = Canned(Err(CompletionError::ServiceUnavailable("503".to_string())));
        let err = complete::<Score>(&svc, "p", &score_schema()).await.unwrap_err();
        assert_eq!(err, CompletionError::ServiceUnavailable("503".to_string()));
    }

    #[test]
    fn test_settings_debug_redacts_key() {
        let settings = CompletionSettings {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: "secret-key".to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        };
        let dbg = format!("{settings:?}");
        assert!(!dbg.contains("secret-key"));
        assert!(dbg.contains(DEFAULT_MODEL));
    }
}
