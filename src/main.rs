//! Dev Toolbox server
//!
//! Entry point: loads configuration, validates the completion credential and
//! serves the dashboard.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dev_toolbox::config::{AppConfig, load_completion_settings};
use dev_toolbox::server;
use dotenvy::dotenv;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    init_tracing();

    let config = AppConfig::load()?;
    info!(
        name: "config.loaded",
        host = %config.server.host,
        port = config.server.port,
        timeout_disabled = config.resilience.timeout_disabled,
        "Configuration loaded"
    );

    // The credential is required before serving anything.
    let settings = match load_completion_settings(&config.upstream) {
        Ok(s) => s,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    server::start_server(Arc::new(config), settings).await
}

/// Structured logging (M-LOG-STRUCTURED). `LOG_FORMAT=json` switches to JSON
/// lines; `RUST_LOG` overrides the default `info` filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_target(true)).init();
    } else {
        registry.with(fmt::layer().with_target(true)).init();
    }
}
