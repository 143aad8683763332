//! Fixed prompt templates and their response shapes.
//!
//! Each builder takes the single user-supplied value and returns a
//! [`Task`]: the rendered prompt plus the schema the answer must follow.

use serde::{Deserialize, Serialize};

use super::schema::{FieldKind, SchemaDescriptor};
use crate::geo::IpRecord;

/// A rendered prompt and its response schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    pub prompt: String,
    pub schema: SchemaDescriptor,
}

/// AI risk score for an IP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// 0 (very low risk) to 100 (very high risk). Not range-checked.
    pub score: f64,
    pub analysis: String,
}

/// One example place inside a ZIP code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleLocation {
    pub name: String,
    pub address: String,
}

/// Example places for a ZIP code (possibly empty).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationExamples {
    pub locations: Vec<ExampleLocation>,
}

/// Parsed user-agent fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UaBreakdown {
    pub browser: String,
    pub os: String,
    pub device: String,
    /// Mobile, Desktop, Tablet, ...
    #[serde(rename = "type")]
    pub device_type: String,
    pub raw: String,
}

/// Disposable-domain verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainVerdict {
    pub is_disposable: bool,
    pub analysis: String,
}

/// Risk scoring over a resolved geolocation record.
#[must_use]
pub fn score_ip(record: &IpRecord) -> Task {
    let info = serde_json::to_string_pretty(record).unwrap_or_default();
    let prompt = format!(
        "Analyze the following IP information and provide a risk score from 0 (very low risk) to 100 (very high risk).\n\
         Also provide a brief analysis explaining the score. Consider factors like if the ISP or organization sounds \
         like a hosting provider, data center, or VPN service (e.g., \"DigitalOcean\", \"OVH\", \"ExpressVPN\"). \
         A residential ISP (e.g., \"Comcast\", \"Verizon\") is generally lower risk.\n\
         IP Information: {info}"
    );

    let schema = SchemaDescriptor::object()
        .field("score", FieldKind::Number, "A risk score from 0 to 100.")
        .field(
            "analysis",
            FieldKind::String,
            "A brief analysis of the IP's risk profile.",
        );

    Task { prompt, schema }
}

/// Example public locations for a US ZIP code.
#[must_use]
pub fn zip_locations(zip: &str) -> Task {
    let prompt = format!(
        "Provide up to 5 example public locations or well-known places for the US ZIP code \"{zip}\". \
         Do not invent addresses. If you cannot find any, return an empty array."
    );

    let schema = SchemaDescriptor::object().bare_field(
        "locations",
        FieldKind::array_of(
            SchemaDescriptor::object()
                .bare_field("name", FieldKind::String)
                .bare_field("address", FieldKind::String),
        ),
    );

    Task { prompt, schema }
}

/// User-agent parsing.
#[must_use]
pub fn parse_user_agent(ua: &str) -> Task {
    let prompt = format!("Parse this User Agent string and provide details: \"{ua}\"");

    let schema = SchemaDescriptor::object()
        .field(
            "browser",
            FieldKind::String,
            "Browser name and version (e.g., Chrome 108.0)",
        )
        .field(
            "os",
            FieldKind::String,
            "Operating System and version (e.g., Windows 10)",
        )
        .field(
            "device",
            FieldKind::String,
            "Device name or model (e.g., iPhone, Pixel 6)",
        )
        .field(
            "type",
            FieldKind::String,
            "Device type (e.g., Mobile, Desktop, Tablet)",
        )
        .field("raw", FieldKind::String, "The original raw user agent string");

    Task { prompt, schema }
}

/// Disposable / high-risk analysis of an email domain.
#[must_use]
pub fn disposable_domain(domain: &str) -> Task {
    let prompt = format!(
        "Analyze the domain \"{domain}\" from the email address provided. \
         Is this a known temporary, disposable, or high-risk email domain? Provide a brief analysis."
    );

    let schema = SchemaDescriptor::object()
        .field(
            "isDisposable",
            FieldKind::Boolean,
            "True if the domain is likely disposable or high-risk.",
        )
        .field("analysis", FieldKind::String, "A brief analysis of the domain.");

    Task { prompt, schema }
}
