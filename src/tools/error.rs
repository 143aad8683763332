//! Error taxonomy shared by all tool controllers.

use crate::completion::CompletionError;
use crate::geo::GeoError;

/// Why a submission ended in the `Failed` phase.
///
/// The `Display` output is the one-line message shown in place of a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    /// Local input check failed; no client was called.
    #[error("{0}")]
    Validation(String),

    /// Transport-level failure talking to the geolocation service.
    #[error("{0}")]
    Network(String),

    /// The geolocation service rejected the address.
    #[error("{0}")]
    InvalidAddress(String),

    /// Transport-level failure talking to the completion service.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The completion service answered with something unusable.
    #[error("{0}")]
    MalformedResponse(String),
}

impl ToolError {
    /// Wrap a completion failure with the tool's own user-facing message.
    ///
    /// The underlying detail is logged, not shown.
    #[must_use]
    pub fn from_completion(err: &CompletionError, message: &str) -> Self {
        tracing::warn!(name: "tool.completion.failed", error = %err, "Completion request failed");
        match err {
            CompletionError::ServiceUnavailable(_) => Self::ServiceUnavailable(message.to_string()),
            CompletionError::MalformedResponse(_) => Self::MalformedResponse(message.to_string()),
        }
    }

    /// Stable machine-readable name.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Network(_) => "network_error",
            Self::InvalidAddress(_) => "invalid_address",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }

    /// True when the failure happened before any client call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<GeoError> for ToolError {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::InvalidAddress(msg) => Self::InvalidAddress(msg),
            GeoError::Network(msg) => Self::Network(msg),
        }
    }
}
