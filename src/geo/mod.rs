//! IP geolocation and caller-IP resolution.
//!
//! The [`GeoLookup`] trait is the seam the tool controllers call through;
//! [`GeoClient`] implements it against the public `ip-api.com` JSON endpoint
//! and an `ipify`-style echo service.
//!
//! # Example
//!
//! ```rust,ignore
//! use dev_toolbox::geo::{GeoClient, GeoLookup};
//!
//! let client = GeoClient::new(&config.upstream)?;
//! let record = client.resolve_ip("8.8.8.8").await?;
//! assert_eq!(record.query, "8.8.8.8");
//! ```

mod client;

pub use client::GeoClient;

use serde::{Deserialize, Serialize};

/// Geolocation metadata for a single IP address.
///
/// Field names follow the geolocation service's wire format so the record
/// can be echoed back verbatim (the risk-scoring prompt embeds it as JSON).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IpRecord {
    pub country: String,
    pub country_code: String,
    /// Short region code (e.g. `CA`).
    pub region: String,
    /// Human-readable region name (e.g. `California`).
    pub region_name: String,
    pub city: String,
    /// Postal code.
    pub zip: String,
    pub lat: f64,
    pub lon: f64,
    pub timezone: String,
    pub isp: String,
    pub org: String,
    /// Autonomous system, e.g. `AS15169 Google LLC`.
    #[serde(rename = "as")]
    pub asn: String,
    /// The IP the record was resolved for.
    pub query: String,
}

impl IpRecord {
    /// `"United States (US)"` style label used by the lookup view.
    #[must_use]
    pub fn country_label(&self) -> String {
        format!("{} ({})", self.country, self.country_code)
    }

    /// `"California (CA)"` style label used by the lookup view.
    #[must_use]
    pub fn region_label(&self) -> String {
        format!("{} ({})", self.region_name, self.region)
    }

    /// `"lat, lon"` pair.
    #[must_use]
    pub fn coordinates(&self) -> String {
        format!("{}, {}", self.lat, self.lon)
    }
}

/// Errors surfaced by the geolocation client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    /// The service answered but rejected the address (malformed, private,
    /// reserved range, ...). Carries the service's own message.
    #[error("{0}")]
    InvalidAddress(String),

    /// The request never completed or came back with a non-success status.
    #[error("{0}")]
    Network(String),
}

/// Resolves IP addresses to location metadata.
#[async_trait::async_trait]
pub trait GeoLookup: Send + Sync + std::fmt::Debug {
    /// Look up a single IP address. No retry.
    async fn resolve_ip(&self, ip: &str) -> Result<IpRecord, GeoError>;

    /// Best-effort lookup of the public IP this process is seen from.
    ///
    /// Any failure degrades to `None`; callers treat it as "unknown".
    async fn resolve_caller_ip(&self) -> Option<String>;
}
