use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Json, Router,
    extract::{ConnectInfo, FromRequestParts, Path, Query, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::completion::{CompletionSettings, GeminiClient};
use crate::config::AppConfig;
use crate::geo::GeoClient;
use crate::tools::ua_generator::{self, UaFamily};
use crate::tools::{Clients, LookupRequest, ToolInstance, ToolKind, ToolState};
use crate::ui::{self, ToolView, nav::ToolId};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>, settings: CompletionSettings) -> anyhow::Result<()> {
    info!(
        name: "completion.config.loaded",
        base_url = %settings.base_url,
        model = %settings.model,
        "Completion configuration loaded"
    );

    let geo = Arc::new(GeoClient::new(&config.upstream)?);
    let completion = Arc::new(GeminiClient::new(settings)?);
    let state = AppState::new(Clients::new(geo, completion), Arc::clone(&config));

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

/// All routes plus the timeout and trace layers.
pub fn build_router(state: AppState) -> Router {
    // A disabled timeout is a very long one so the layer stack keeps one type.
    let timeout_duration = if state.config.resilience.timeout_disabled {
        Duration::from_secs(365 * 24 * 60 * 60)
    } else {
        Duration::from_secs(state.config.resilience.request_timeout_secs)
    };

    Router::new()
        .route("/", get(dashboard_handler))
        .route("/tools/{tool_id}", get(tool_handler))
        .route("/tools/ua-generator/generate", get(ua_generate_handler))
        .route("/tools/{tool_id}/{instance_id}", post(submit_handler))
        .route("/api/lookup", post(api_lookup))
        .route("/api/caller-ip", get(api_caller_ip))
        .nest_service("/static", ServeDir::new("static"))
        .layer(axum::middleware::from_fn(
            move |req: Request, next: Next| async move {
                match tokio::time::timeout(timeout_duration, next.run(req)).await {
                    Ok(res) => res,
                    Err(_) => (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response(),
                }
            },
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// Handler failures that are not tool outcomes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("tool instance not found")]
    NotFound,
    #[error("failed to render page: {0}")]
    Render(#[from] askama::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            Self::Render(err) => {
                tracing::error!(name: "ui.render.failed", error = %err, "Template rendering failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Page Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// GET / - Dashboard.
async fn dashboard_handler() -> Result<Html<String>, AppError> {
    Ok(Html(ui::dashboard_page()?))
}

#[derive(Debug, Default, Deserialize)]
struct ViewQuery {
    /// UA generator only: render with a freshly generated string. Other
    /// tools ignore it.
    family: Option<String>,
}

/// GET /tools/:tool_id - Open a tool view with a fresh instance.
async fn tool_handler(
    State(state): State<AppState>,
    Path(tool_id): Path<String>,
    Query(query): Query<ViewQuery>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
) -> Result<Html<String>, AppError> {
    let id = ToolId::parse_or_dashboard(&tool_id);
    let Some(kind) = id.kind() else {
        let page = match id {
            ToolId::UaGenerator => {
                let family = query.family.as_deref().and_then(UaFamily::parse);
                ui::ua_generator_page(family.map(ua_generator::generate))?
            }
            _ => ui::dashboard_page()?,
        };
        return Ok(Html(page));
    };

    let instance = state.tools.create(kind);
    let mut auto_submit = false;
    if kind == ToolKind::IpLookup {
        if let Some(ip) = caller_ip(&headers, peer, &state.clients).await {
            instance.prefill(ip);
            auto_submit = true;
        }
    }

    info!(
        name: "tool.opened",
        kind = %kind,
        instance = %instance.id(),
        created_at = %instance.created_at().to_rfc3339(),
        "Tool instance opened"
    );

    let snapshot = instance.snapshot();
    let page = ui::tool_page(&ToolView {
        kind,
        instance_id: instance.id().to_string(),
        state: &snapshot,
        auto_submit,
    })?;
    Ok(Html(page))
}

#[derive(Debug, Default, Deserialize)]
struct SubmitForm {
    #[serde(default)]
    input: String,
}

/// POST /tools/:tool_id/:instance_id - Submit a tool form.
///
/// HTMX requests get the result fragment, or `204` when the instance is
/// busy; plain form posts get the whole page.
async fn submit_handler(
    State(state): State<AppState>,
    Path((tool_id, instance_id)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<SubmitForm>,
) -> Result<Response, AppError> {
    let instance = find_instance(&state, &tool_id, &instance_id).ok_or(AppError::NotFound)?;
    let kind = instance.kind();
    let submission = instance.submit(form.input, &state.clients).await;

    if is_htmx(&headers) {
        if submission.is_ignored() {
            return Ok(StatusCode::NO_CONTENT.into_response());
        }
        let fragment = ui::result_fragment(kind, submission.state())?;
        return Ok(Html(fragment).into_response());
    }

    let page = ui::tool_page(&ToolView {
        kind,
        instance_id: instance.id().to_string(),
        state: submission.state(),
        auto_submit: false,
    })?;
    Ok(Html(page).into_response())
}

fn find_instance(state: &AppState, tool_id: &str, instance_id: &str) -> Option<Arc<ToolInstance>> {
    let kind = ToolId::parse(tool_id)?.kind()?;
    let id = Uuid::parse_str(instance_id).ok()?;
    state.tools.get(&id).filter(|instance| instance.kind() == kind)
}

#[derive(Debug, Deserialize)]
struct GenerateQuery {
    family: UaFamily,
}

/// GET /tools/ua-generator/generate - One random UA string as a fragment.
async fn ua_generate_handler(Query(query): Query<GenerateQuery>) -> Result<Html<String>, AppError> {
    let sample = ua_generator::generate(query.family);
    Ok(Html(ui::ua_sample_fragment(sample)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// POST /api/lookup - Run one tool request and return its final state.
async fn api_lookup(
    State(state): State<AppState>,
    Json(req): Json<LookupRequest>,
) -> (StatusCode, Json<ToolState>) {
    let instance = Arc::new(ToolInstance::new(req.kind));
    let result = instance.submit(req.payload, &state.clients).await.into_state();
    (lookup_status(&result), Json(result))
}

fn lookup_status(state: &ToolState) -> StatusCode {
    match state.error_code {
        None => StatusCode::OK,
        Some("validation_error") => StatusCode::UNPROCESSABLE_ENTITY,
        Some(_) => StatusCode::BAD_GATEWAY,
    }
}

#[derive(Debug, Serialize)]
struct CallerIp {
    ip: String,
}

/// GET /api/caller-ip - Best-effort caller address; empty when unknown.
async fn api_caller_ip(
    State(state): State<AppState>,
    PeerAddr(peer): PeerAddr,
    headers: HeaderMap,
) -> Json<CallerIp> {
    let ip = caller_ip(&headers, peer, &state.clients).await.unwrap_or_default();
    Json(CallerIp { ip })
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn is_htmx(headers: &HeaderMap) -> bool {
    headers.contains_key("hx-request")
}

/// TCP peer address of the connection, when the server was started with
/// connect info.
#[derive(Debug, Clone, Copy)]
struct PeerAddr(Option<IpAddr>);

impl<S: Send + Sync> FromRequestParts<S> for PeerAddr {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let peer = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .ok()
            .map(|ConnectInfo(addr)| addr.ip());
        Ok(Self(peer))
    }
}

/// Caller address, in order: a public `X-Forwarded-For` client entry, a
/// public TCP peer, then the echo service.
///
/// The echo service sees the server's own egress address, so it only helps
/// when the browser and server share a network.
async fn caller_ip(headers: &HeaderMap, peer: Option<IpAddr>, clients: &Clients) -> Option<String> {
    if let Some(ip) = forwarded_public_ip(headers).or_else(|| peer.filter(is_public)) {
        return Some(ip.to_string());
    }
    clients.geo.resolve_caller_ip().await
}

fn forwarded_public_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")?
        .to_str()
        .ok()?
        .split(',')
        .next()?
        .trim()
        .parse::<IpAddr>()
        .ok()
        .filter(is_public)
}

fn is_public(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation())
        }
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            !(v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn forwarded(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_forwarded_public_ip() {
        assert_eq!(
            forwarded_public_ip(&forwarded("8.8.4.4, 10.0.0.1")),
            Some("8.8.4.4".parse().unwrap())
        );
        assert_eq!(forwarded_public_ip(&forwarded("10.1.2.3")), None);
        assert_eq!(forwarded_public_ip(&forwarded("127.0.0.1")), None);
        assert_eq!(forwarded_public_ip(&forwarded("fe80::1")), None);
        assert_eq!(forwarded_public_ip(&forwarded("garbage")), None);
        assert_eq!(forwarded_public_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_lookup_status() {
        let mut state = ToolState::default();
        assert_eq!(lookup_status(&state), StatusCode::OK);
        state.error_code = Some("validation_error");
        assert_eq!(lookup_status(&state), StatusCode::UNPROCESSABLE_ENTITY);
        state.error_code = Some("network_error");
        assert_eq!(lookup_status(&state), StatusCode::BAD_GATEWAY);
    }
}
