//! Startup configuration: provisioned resource identities and routing
//! endpoint settings.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::debounce::DEFAULT_WINDOW;
use crate::osrm::OsrmConfig;
use crate::waypoint::ViewportState;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub region: String,
    /// Route calculator identity passed with every routing request.
    pub route_calculator: String,
    pub map: MapConfig,
    #[serde(default)]
    pub place_index: Option<String>,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub routing: OsrmConfig,
    /// Quiescence window for waypoint edits, in milliseconds (default: 500)
    #[serde(default = "AppConfig::default_debounce_ms")]
    pub debounce_ms: u64,
    /// Viewport used when a session starts without a fragment
    #[serde(default)]
    pub default_viewport: ViewportState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    pub name: String,
    #[serde(default)]
    pub style: Option<String>,
}

/// Identity pool settings. Opaque to the routing core.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub identity_pool_id: Option<String>,
    #[serde(default)]
    pub user_pool_id: Option<String>,
    #[serde(default)]
    pub user_pool_client_id: Option<String>,
}

impl AppConfig {
    fn default_debounce_ms() -> u64 {
        DEFAULT_WINDOW.as_millis() as u64
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::ReadError(e.to_string()))?;

        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse config: {0}")]
    ParseError(String),
}
