use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::arr::{AppKind, HuntKind};

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Sonarr instances, processed in order.
    #[serde(default)]
    pub sonarr: Vec<InstanceConfig>,
    /// Radarr instances, processed in order.
    #[serde(default)]
    pub radarr: Vec<InstanceConfig>,
    #[serde(default)]
    pub state: StateConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Configured instances of one managed-system type.
    pub fn instances(&self, app: AppKind) -> &[InstanceConfig] {
        match app {
            AppKind::Sonarr => &self.sonarr,
            AppKind::Radarr => &self.radarr,
        }
    }
}

/// One connection to a running Sonarr or Radarr.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InstanceConfig {
    /// Instance name, part of every ledger key (defaults to the system name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL (e.g., "http://localhost:8989").
    #[serde(default)]
    pub url: String,
    /// API key sent as `X-Api-Key`.
    #[serde(default)]
    pub api_key: String,
    /// Missing items to search per cycle (<= 0 disables).
    #[serde(default = "default_hunt_missing")]
    pub hunt_missing: i64,
    /// Cutoff-unmet items to search per cycle (<= 0 disables).
    #[serde(default)]
    pub hunt_upgrades: i64,
    /// Only consider monitored items (and, for episodes, monitored series).
    #[serde(default = "default_true")]
    pub monitored_only: bool,
    /// Skip missing items whose air/release date is in the future.
    #[serde(default = "default_true")]
    pub skip_future: bool,
}

impl InstanceConfig {
    /// Create an instance config with default limits and policy flags.
    pub fn new(name: impl Into<String>, url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            url: url.into(),
            api_key: api_key.into(),
            hunt_missing: default_hunt_missing(),
            hunt_upgrades: 0,
            monitored_only: true,
            skip_future: true,
        }
    }

    /// The name used in logs and ledger keys.
    pub fn display_name(&self, app: AppKind) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => app.display_name(),
        }
    }

    /// Per-cycle limit for one hunt kind.
    pub fn limit(&self, kind: HuntKind) -> i64 {
        match kind {
            HuntKind::Missing => self.hunt_missing,
            HuntKind::Upgrade => self.hunt_upgrades,
        }
    }

    /// Whether both `url` and `api_key` are present.
    pub fn has_connection(&self) -> bool {
        !self.url.trim().is_empty() && !self.api_key.trim().is_empty()
    }
}

fn default_hunt_missing() -> i64 {
    5
}

fn default_true() -> bool {
    true
}

/// Search ledger configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub database: PathBuf,
    /// Cooldown before the same item can be searched again.
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u32,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            database: default_db_path(),
            ttl_hours: default_ttl_hours(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./huntarr.db")
}

fn default_ttl_hours() -> u32 {
    168
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 120)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    120
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub sonarr: Vec<SanitizedInstanceConfig>,
    pub radarr: Vec<SanitizedInstanceConfig>,
    pub state: StateConfig,
    pub http: HttpConfig,
}

/// Sanitized instance config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedInstanceConfig {
    pub name: String,
    pub url: String,
    pub api_key_configured: bool,
    pub hunt_missing: i64,
    pub hunt_upgrades: i64,
    pub monitored_only: bool,
    pub skip_future: bool,
}

impl SanitizedInstanceConfig {
    fn new(app: AppKind, instance: &InstanceConfig) -> Self {
        Self {
            name: instance.display_name(app).to_string(),
            url: instance.url.clone(),
            api_key_configured: !instance.api_key.is_empty(),
            hunt_missing: instance.hunt_missing,
            hunt_upgrades: instance.hunt_upgrades,
            monitored_only: instance.monitored_only,
            skip_future: instance.skip_future,
        }
    }
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let sanitize = |app: AppKind| {
            config
                .instances(app)
                .iter()
                .map(|i| SanitizedInstanceConfig::new(app, i))
                .collect()
        };

        Self {
            sonarr: sanitize(AppKind::Sonarr),
            radarr: sanitize(AppKind::Radarr),
            state: config.state.clone(),
            http: config.http.clone(),
        }
    }
}
