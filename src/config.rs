use crate::completion::{CompletionSettings, DEFAULT_BASE_URL, DEFAULT_MODEL};
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Config file picked up from the working directory when none is given.
const CWD_CONFIG_FILE: &str = "config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub resilience: ResilienceConfig,
    pub tools: ToolsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

/// External services the tools call.
#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Geolocation API base; lookups go to `{base}/json/{ip}`.
    pub geo_base_url: String,
    /// Echo service returning `{ "ip": ... }`.
    pub caller_ip_url: String,
    /// Timeout applied to every outbound request.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    /// Inbound request timeout.
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ToolsConfig {
    /// Idle tool instances older than this are pruned.
    pub instance_ttl_secs: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    /// Priority: CLI flag > CLI env var > `DEVTOOLS_` env > config file > defaults.
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder()
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("upstream.geo_base_url", "http://ip-api.com")?
            .set_default("upstream.caller_ip_url", "https://api.ipify.org?format=json")?
            .set_default("upstream.request_timeout_secs", 30)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 60)?
            .set_default("tools.instance_ttl_secs", 30 * 60)?;

        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else if Path::new(CWD_CONFIG_FILE).exists() {
            builder = builder.add_source(File::from(Path::new(CWD_CONFIG_FILE)));
        }

        // E.g. DEVTOOLS_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("DEVTOOLS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", port)?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Missing or unusable completion settings. Fatal at startup.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Missing required env var: {0}")]
    Missing(&'static str),
    #[error("{0} cannot be empty")]
    Empty(&'static str),
    #[error("{0} is not valid unicode")]
    NotUnicode(&'static str),
}

/// Read the completion credential and model from the environment.
///
/// `API_KEY` is required. `COMPLETION_MODEL` and `COMPLETION_BASE_URL` fall
/// back to the Gemini defaults.
pub fn load_completion_settings(
    upstream: &UpstreamConfig,
) -> Result<CompletionSettings, SettingsError> {
    let api_key = match env::var("API_KEY") {
        Ok(key) => key,
        Err(env::VarError::NotPresent) => return Err(SettingsError::Missing("API_KEY")),
        Err(env::VarError::NotUnicode(_)) => return Err(SettingsError::NotUnicode("API_KEY")),
    };
    if api_key.trim().is_empty() {
        return Err(SettingsError::Empty("API_KEY"));
    }

    let model = env::var("COMPLETION_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let base_url = env::var("COMPLETION_BASE_URL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    Ok(CompletionSettings {
        base_url,
        api_key: api_key.trim().to_string(),
        model,
        timeout_secs: upstream.request_timeout_secs,
    })
}
