//! Environment resolution for Init.ai tools.
//!
//! Picks the API deployment (staging or production), its REST base URL and
//! realtime app key, and the API token. Sources merge in this order, later
//! ones winning: built-in defaults, the TOML config file, `INITAI_*`
//! environment variables.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use initai_api::{ApiProfile, ClientConfig, TransportConfig};

/// SDK version, reported to the push service and in user agents.
pub const VERSION: &str = initai_api::VERSION;

/// Prefix of the environment variables read by [`load`].
pub const ENV_PREFIX: &str = "INITAI_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API token configured (set INITAI_TOKEN or `token` in {path})")]
    NoToken { path: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── Environment ─────────────────────────────────────────────────────

/// Resolved settings for one deployment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Environment {
    /// Which deployment to talk to.
    #[serde(default)]
    pub api: ApiProfile,

    /// REST base URL override. Defaults to the profile's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Push service app key override. Defaults to the profile's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pusher_app_key: Option<String>,

    /// API token (plaintext; prefer `INITAI_TOKEN`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// HTTP request timeout in seconds. Unset means no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Environment {
    pub fn base_url(&self) -> &str {
        self.api_base_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.api.base_url())
    }

    pub fn pusher_app_key(&self) -> &str {
        self.pusher_app_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .unwrap_or_else(|| self.api.pusher_app_key())
    }

    /// Client configuration for this environment.
    ///
    /// `token` wins over the configured one when given.
    pub fn client_config(&self, token: Option<&str>) -> Result<ClientConfig, ConfigError> {
        let token = token
            .or(self.token.as_deref())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ConfigError::NoToken {
                path: config_path().display().to_string(),
            })?;
        Ok(ClientConfig::new(token).with_base_url(self.base_url()))
    }

    pub fn transport(&self) -> TransportConfig {
        let transport = TransportConfig::default();
        match self.timeout {
            Some(secs) => transport.with_timeout(Duration::from_secs(secs)),
            None => transport,
        }
    }

    /// Reject values that cannot work before anything is sent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(raw) = self.api_base_url.as_deref() {
            let url = url::Url::parse(raw).map_err(|e| ConfigError::Validation {
                field: "api_base_url".into(),
                reason: e.to_string(),
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(ConfigError::Validation {
                    field: "api_base_url".into(),
                    reason: format!("unsupported scheme '{}'", url.scheme()),
                });
            }
        }
        if self.timeout == Some(0) {
            return Err(ConfigError::Validation {
                field: "timeout".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("ai", "init", "initai").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("initai");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// The merged provider stack for `path`.
pub fn figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Environment::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
}

/// Load from the canonical config file and the environment.
pub fn load() -> Result<Environment, ConfigError> {
    load_from(&config_path())
}

/// Load from `path` and the environment. A missing file is not an error.
pub fn load_from(path: &Path) -> Result<Environment, ConfigError> {
    let env: Environment = figment(path).extract()?;
    env.validate()?;
    Ok(env)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize to TOML and write to `path`, creating parent directories.
pub fn save_to(env: &Environment, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(env)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}
