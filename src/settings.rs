//! Handles settings for the service.
//!
//! Values come from built-in defaults, then an optional `settings.toml`,
//! then `SHAREBILL__`-prefixed environment variables
//! (e.g. `SHAREBILL__SERVER__PORT=9000`).
use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

pub const DEFAULT_PATH: &str = "settings";
const ENV_PREFIX: &str = "SHAREBILL";

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Server {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Backend {
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dashboard {
    /// When false the dashboard trusts the backend's per-group balance
    /// instead of fetching every expense list.
    pub recompute_balances: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Cors {
    pub allowed_origin: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub backend: Backend,
    pub dashboard: Dashboard,
    #[serde(default)]
    pub cors: Cors,
}

impl Settings {
    /// Loads the settings. An explicit `path` must exist; the default
    /// `settings.toml` is optional.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        defaults()?
            .add_source(File::with_name(path.unwrap_or(DEFAULT_PATH)).required(path.is_some()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("app.level", "info")?
        .set_default("server.bind", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("backend.base_url", "http://localhost:3001")?
        .set_default("dashboard.recompute_balances", true)
}
