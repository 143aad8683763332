//! HTTP implementation of [`GeoLookup`].

use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::config::UpstreamConfig;

use super::{GeoError, GeoLookup, IpRecord};

/// Fallback when the service reports `fail` without a message.
const INVALID_ADDRESS_MESSAGE: &str = "Invalid IP address";

/// Reported for non-success HTTP statuses.
const BAD_STATUS_MESSAGE: &str = "Network response was not ok";

/// Reported when the request itself does not complete.
const UNREACHABLE_MESSAGE: &str = "Failed to reach the geolocation service";

/// Upper bound on the caller-IP echo request; page rendering waits on it.
const CALLER_IP_TIMEOUT: Duration = Duration::from_secs(2);

/// Body of `GET /json/{ip}`.
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    record: IpRecord,
}

/// Body of the caller-IP echo service.
#[derive(Debug, Deserialize)]
struct CallerIpResponse {
    #[serde(default)]
    ip: String,
}

/// Client for the geolocation and caller-IP services.
#[derive(Clone)]
pub struct GeoClient {
    http: reqwest::Client,
    base_url: Url,
    caller_ip_url: Url,
}

impl std::fmt::Debug for GeoClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoClient")
            .field("base_url", &self.base_url.as_str())
            .field("caller_ip_url", &self.caller_ip_url.as_str())
            .finish()
    }
}

impl GeoClient {
    /// Create a client from the upstream configuration.
    ///
    /// Fails when either URL does not parse or cannot carry a path.
    pub fn new(upstream: &UpstreamConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&upstream.geo_base_url)?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("geolocation base URL cannot carry a path: {base_url}");
        }
        let caller_ip_url = Url::parse(&upstream.caller_ip_url)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(upstream.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url,
            caller_ip_url,
        })
    }

    /// `{base}/json/{ip}` with `ip` encoded as a single path segment.
    fn lookup_url(&self, ip: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("json").push(ip);
        }
        url
    }
}

#[async_trait::async_trait]
impl GeoLookup for GeoClient {
    async fn resolve_ip(&self, ip: &str) -> Result<IpRecord, GeoError> {
        let url = self.lookup_url(ip);

        let resp = self.http.get(url).send().await.map_err(|e| {
            tracing::warn!(name: "geo.lookup.transport", ip = %ip, error = %e, "Geolocation request failed");
            GeoError::Network(UNREACHABLE_MESSAGE.to_string())
        })?;

        if !resp.status().is_success() {
            tracing::warn!(
                name: "geo.lookup.status",
                ip = %ip,
                status = %resp.status(),
                "Geolocation service returned non-success status"
            );
            return Err(GeoError::Network(BAD_STATUS_MESSAGE.to_string()));
        }

        let body: LookupResponse = resp.json().await.map_err(|e| {
            tracing::warn!(name: "geo.lookup.decode", ip = %ip, error = %e, "Geolocation body is not JSON");
            GeoError::Network(BAD_STATUS_MESSAGE.to_string())
        })?;

        if body.status == "fail" {
            let message = body
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| INVALID_ADDRESS_MESSAGE.to_string());
            tracing::info!(name: "geo.lookup.rejected", ip = %ip, message = %message, "Address rejected");
            return Err(GeoError::InvalidAddress(message));
        }

        tracing::debug!(name: "geo.lookup.ok", ip = %ip, country = %body.record.country_code, "Address resolved");
        Ok(body.record)
    }

    async fn resolve_caller_ip(&self) -> Option<String> {
        let request = self
            .http
            .get(self.caller_ip_url.clone())
            .timeout(CALLER_IP_TIMEOUT);
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                tracing::debug!(name: "geo.caller_ip.transport", error = %e, "Caller IP request failed");
                return None;
            }
        };

        if !resp.status().is_success() {
            tracing::debug!(name: "geo.caller_ip.status", status = %resp.status(), "Caller IP service returned non-success status");
            return None;
        }

        match resp.json::<CallerIpResponse>().await {
            Ok(body) => Some(body.ip.trim().to_string()).filter(|ip| !ip.is_empty()),
            Err(e) => {
                tracing::debug!(name: "geo.caller_ip.decode", error = %e, "Caller IP body is not JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn upstream(server: &MockServer) -> UpstreamConfig {
        UpstreamConfig {
            geo_base_url: server.uri(),
            caller_ip_url: format!("{}/caller", server.uri()),
            request_timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_resolve_ip_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "success",
                "country": "United States",
                "countryCode": "US",
                "city": "Ashburn",
                "as": "AS15169 Google LLC",
                "query": "8.8.8.8"
            })))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let record = client.resolve_ip("8.8.8.8").await.unwrap();
        assert_eq!(record.query, "8.8.8.8");
        assert_eq!(record.city, "Ashburn");
        assert_eq!(record.asn, "AS15169 Google LLC");
    }

    #[tokio::test]
    async fn test_resolve_ip_fail_status_uses_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/10.0.0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "fail",
                "message": "private range",
                "query": "10.0.0.1"
            })))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let err = client.resolve_ip("10.0.0.1").await.unwrap_err();
        assert_eq!(err, GeoError::InvalidAddress("private range".to_string()));
    }

    #[tokio::test]
    async fn test_resolve_ip_fail_without_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "fail" })))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let err = client.resolve_ip("nope").await.unwrap_err();
        assert_eq!(err, GeoError::InvalidAddress(INVALID_ADDRESS_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_resolve_ip_http_error_is_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let err = client.resolve_ip("8.8.8.8").await.unwrap_err();
        assert_eq!(err, GeoError::Network(BAD_STATUS_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_resolve_ip_unreachable_is_network() {
        let config = UpstreamConfig {
            geo_base_url: "http://127.0.0.1:1".to_string(),
            caller_ip_url: "http://127.0.0.1:1/".to_string(),
            request_timeout_secs: 2,
        };
        let client = GeoClient::new(&config).unwrap();
        let err = client.resolve_ip("8.8.8.8").await.unwrap_err();
        assert!(matches!(err, GeoError::Network(_)));
    }

    #[tokio::test]
    async fn test_resolve_ip_non_json_body_is_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/json/8.8.8.8"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let err = client.resolve_ip("8.8.8.8").await.unwrap_err();
        assert_eq!(err, GeoError::Network(BAD_STATUS_MESSAGE.to_string()));
    }

    #[test]
    fn test_lookup_url_encodes_segment() {
        let config = UpstreamConfig {
            geo_base_url: "http://ip-api.com/".to_string(),
            caller_ip_url: "https://api.ipify.org?format=json".to_string(),
            request_timeout_secs: 2,
        };
        let client = GeoClient::new(&config).unwrap();
        assert_eq!(
            client.lookup_url("8.8.8.8").as_str(),
            "http://ip-api.com/json/8.8.8.8"
        );
        assert_eq!(
            client.lookup_url("a/b?c").as_str(),
            "http://ip-api.com/json/a%2Fb%3Fc"
        );
    }

    #[tokio::test]
    async fn test_caller_ip_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/caller"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "203.0.113.7" })))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        assert_eq!(client.resolve_caller_ip().await.as_deref(), Some("203.0.113.7"));
    }

    #[tokio::test]
    async fn test_caller_ip_degrades_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/caller"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        assert_eq!(client.resolve_caller_ip().await, None);
    }

    #[tokio::test]
    async fn test_caller_ip_empty_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/caller"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ip": "" })))
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        assert_eq!(client.resolve_caller_ip().await, None);
    }

    #[tokio::test]
    async fn test_caller_ip_slow_echo_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/caller"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "ip": "203.0.113.7" }))
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let client = GeoClient::new(&upstream(&server)).unwrap();
        let started = std::time::Instant::now();
        assert_eq!(client.resolve_caller_ip().await, None);
        assert!(started.elapsed() < Duration::from_secs(5));
    }
}
