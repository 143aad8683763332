//! Tool controllers.
//!
//! Each tool module exposes a `check` function (local validation) and a
//! `run` function (client calls). [`ToolKind::check`] and [`execute`]
//! dispatch to them; [`ToolInstance`] wraps both in the per-instance state
//! machine.
//!
//! # Tools
//!
//! - [`ip_lookup`]: geolocation record for an IP
//! - [`ip_score`]: geolocation record, then an AI risk score
//! - [`zip_lookup`]: AI example locations for a US ZIP code
//! - [`ua_check`]: AI breakdown of a user-agent string
//! - [`email_check`]: format check, then AI analysis of the domain
//! - [`ua_generator`]: random user-agent strings (no client call)

pub mod email_check;
pub mod error;
pub mod ip_lookup;
pub mod ip_score;
mod state;
mod store;
pub mod ua_check;
pub mod ua_generator;
pub mod zip_lookup;

pub use error::ToolError;
pub use state::{Submission, ToolInstance, ToolPhase, ToolState};
pub use store::ToolStore;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::completion::CompletionService;
use crate::completion::prompts::{LocationExamples, RiskAssessment, UaBreakdown};
use crate::geo::{GeoLookup, IpRecord};
use email_check::EmailVerdict;

/// The request-bearing tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    IpLookup,
    IpScore,
    ZipLookup,
    UaCheck,
    EmailCheck,
}

impl ToolKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IpLookup => "ip-lookup",
            Self::IpScore => "ip-score",
            Self::ZipLookup => "zip-lookup",
            Self::UaCheck => "ua-check",
            Self::EmailCheck => "email-check",
        }
    }

    /// Local validation. Never calls a client.
    pub fn check(self, input: &str) -> Result<Checked, ToolError> {
        match self {
            Self::IpLookup => ip_lookup::check(input),
            Self::IpScore => ip_score::check(input),
            Self::ZipLookup => zip_lookup::check(input),
            Self::UaCheck => ua_check::check(input),
            Self::EmailCheck => email_check::check(input),
        }
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub kind: ToolKind,
    pub payload: String,
}

/// Outcome of a successful validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Checked {
    /// Call the clients with this normalized payload.
    Dispatch(String),
    /// Answered locally; no client call.
    Resolved(ToolOutput),
}

/// Render-ready result of any tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolOutput {
    IpRecord(IpRecord),
    RiskScore(RiskAssessment),
    Locations(LocationExamples),
    UserAgent(UaBreakdown),
    Email(EmailVerdict),
}

/// The two external clients, shared by every tool.
#[derive(Debug, Clone)]
pub struct Clients {
    pub geo: Arc<dyn GeoLookup>,
    pub completion: Arc<dyn CompletionService>,
}

impl Clients {
    pub fn new(geo: Arc<dyn GeoLookup>, completion: Arc<dyn CompletionService>) -> Self {
        Self { geo, completion }
    }
}

/// Run the client calls for an already-validated payload.
pub async fn execute(kind: ToolKind, payload: &str, clients: &Clients) -> Result<ToolOutput, ToolError> {
    let geo = clients.geo.as_ref();
    let completion = clients.completion.as_ref();

    match kind {
        ToolKind::IpLookup => ip_lookup::run(geo, payload).await.map(ToolOutput::IpRecord),
        ToolKind::IpScore => ip_score::run(geo, completion, payload)
            .await
            .map(ToolOutput::RiskScore),
        ToolKind::ZipLookup => zip_lookup::run(completion, payload)
            .await
            .map(ToolOutput::Locations),
        ToolKind::UaCheck => ua_check::run(completion, payload)
            .await
            .map(ToolOutput::UserAgent),
        ToolKind::EmailCheck => email_check::run(completion, payload)
            .await
            .map(ToolOutput::Email),
    }
}
