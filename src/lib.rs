//! Dev Toolbox
//!
//! A server-rendered dashboard of small developer utilities: IP geolocation,
//! AI risk scoring, ZIP-code example locations, user-agent generation and
//! parsing, and email-domain checks.
//!
//! # Architecture
//!
//! - **Server**: Axum router with HTMX-driven forms
//! - **Clients**: geolocation REST API and a schema-constrained completion API
//! - **Tools**: per-instance controllers with an explicit state machine
//! - **UI**: askama templates inside common navigation chrome
//!
//! # Modules
//!
//! - [`geo`]: geolocation and caller-IP client
//! - [`completion`]: structured completion client and prompt catalogue
//! - [`tools`]: tool controllers and the instance store
//! - [`ui`]: pages and fragments
//! - [`server`]: routes and startup

// Allow pedantic clippy warnings that don't add value for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::cargo_common_metadata)]
#![allow(clippy::multiple_crate_versions)]
#![allow(clippy::unused_async)]

pub mod completion;
pub mod config;
pub mod geo;
pub mod server;
pub mod tools;
pub mod ui;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use tools::{Clients, ToolStore};

/// Application state shared across all handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Geolocation and completion clients.
    pub clients: Clients,
    /// Open tool instances.
    pub tools: ToolStore,
    /// Global Configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    #[must_use]
    pub fn new(clients: Clients, config: Arc<AppConfig>) -> Self {
        let ttl = Duration::from_secs(config.tools.instance_ttl_secs);
        Self {
            clients,
            tools: ToolStore::new(ttl),
            config,
        }
    }
}
