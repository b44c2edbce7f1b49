//! Runtime settings: service endpoints, HTTP behaviour and the default
//! administrative level, with environment overrides.

use crate::acquisition::boundaries::{AdminLevel, DEFAULT_BOUNDARY_URL};
use crate::acquisition::http_client::DEFAULT_USER_AGENT;
use crate::acquisition::iso_codes::DEFAULT_ISO_CSV_URL;
use crate::render::basemap::DEFAULT_TILE_URL;
use std::time::Duration;
use thiserror::Error;

pub const ENV_ISO_CSV_URL: &str = "GEOTHUMB_ISO_CSV_URL";
pub const ENV_BOUNDARY_URL: &str = "GEOTHUMB_BOUNDARY_URL";
pub const ENV_TILE_URL: &str = "GEOTHUMB_TILE_URL";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "GEOTHUMB_HTTP_TIMEOUT_SECS";
pub const ENV_USER_AGENT: &str = "GEOTHUMB_USER_AGENT";
pub const ENV_ADMIN_LEVEL: &str = "GEOTHUMB_ADMIN_LEVEL";

/// Value of [`ENV_TILE_URL`] that turns the basemap off.
const TILES_DISABLED: &str = "none";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// ISO-3166 reference CSV.
    pub iso_csv_url: String,
    /// geoBoundaries request endpoint.
    pub boundary_url: String,
    /// XYZ tile template; `None` draws on a plain background.
    pub tile_url: Option<String>,
    /// No timeout when unset.
    pub http_timeout: Option<Duration>,
    /// Sent with every request; tile servers reject anonymous clients.
    pub user_agent: String,
    /// Level used when a command does not name one.
    pub admin_level: AdminLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            iso_csv_url: DEFAULT_ISO_CSV_URL.to_string(),
            boundary_url: DEFAULT_BOUNDARY_URL.to_string(),
            tile_url: Some(DEFAULT_TILE_URL.to_string()),
            http_timeout: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            admin_level: AdminLevel::default(),
        }
    }
}

impl Settings {
    /// Defaults overridden by `GEOTHUMB_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let mut settings = Settings::default();

        if let Some(url) = get(ENV_ISO_CSV_URL) {
            settings.iso_csv_url = url;
        }
        if let Some(url) = get(ENV_BOUNDARY_URL) {
            settings.boundary_url = url;
        }
        if let Some(url) = get(ENV_TILE_URL) {
            settings.tile_url = if url.eq_ignore_ascii_case(TILES_DISABLED) {
                None
            } else {
                Some(url)
            };
        }
        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let parsed: u64 = secs.parse().map_err(|e: std::num::ParseIntError| ConfigError::Invalid {
                var: ENV_HTTP_TIMEOUT_SECS,
                value: secs.clone(),
                reason: e.to_string(),
            })?;
            settings.http_timeout = Some(Duration::from_secs(parsed));
        }
        if let Some(agent) = get(ENV_USER_AGENT) {
            settings.user_agent = agent;
        }
        if let Some(level) = get(ENV_ADMIN_LEVEL) {
            settings.admin_level = level.parse().map_err(|reason| ConfigError::Invalid {
                var: ENV_ADMIN_LEVEL,
                value: level.clone(),
                reason,
            })?;
        }
        Ok(settings)
    }
}
