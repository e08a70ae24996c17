//! Configuration loading
//!
//! Resolution priority for every value: environment variable, then TOML
//! config file, then compiled default. Missing config files degrade to
//! defaults with a warning rather than failing startup.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

pub const DEFAULT_MATCHING_BASE_URL: &str = "http://127.0.0.1:8710";
pub const DEFAULT_RESET_ACK_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_RESET_TARGET_URL: &str = "/diagnosis";

/// Resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Base URL of the scoring service.
    pub matching_base_url: String,
    /// Timeout for the scoring call. None preserves the historical
    /// behavior of waiting indefinitely.
    pub request_timeout_secs: Option<u64>,
    /// How long the reset protocol waits for the hosting page to react
    /// before falling back to a full navigation.
    pub reset_ack_timeout_ms: u64,
    /// Navigation target of the reset fallback.
    pub reset_target_url: String,
    /// Use the fixed storage key names instead of per-tab scoped ones.
    pub shared_key_space: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            matching_base_url: DEFAULT_MATCHING_BASE_URL.to_string(),
            request_timeout_secs: None,
            reset_ack_timeout_ms: DEFAULT_RESET_ACK_TIMEOUT_MS,
            reset_target_url: DEFAULT_RESET_TARGET_URL.to_string(),
            shared_key_space: false,
        }
    }
}

/// TOML mirror of `AppConfig`; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub matching_base_url: Option<String>,
    pub request_timeout_secs: Option<u64>,
    pub reset_ack_timeout_ms: Option<u64>,
    pub reset_target_url: Option<String>,
    pub shared_key_space: Option<bool>,
}

impl AppConfig {
    /// Load configuration, overlaying TOML file values and then environment
    /// variables onto the compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = path {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
                let toml_config: TomlConfig = toml::from_str(&content)
                    .map_err(|e| Error::Config(format!("parse {}: {e}", path.display())))?;
                config.apply_toml(toml_config);
                info!(path = %path.display(), "configuration file loaded");
            } else {
                warn!(path = %path.display(), "configuration file not found; using defaults");
            }
        }

        config.apply_env();
        Ok(config)
    }

    fn apply_toml(&mut self, toml_config: TomlConfig) {
        if let Some(url) = toml_config.matching_base_url {
            self.matching_base_url = url;
        }
        if let Some(secs) = toml_config.request_timeout_secs {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(ms) = toml_config.reset_ack_timeout_ms {
            self.reset_ack_timeout_ms = ms;
        }
        if let Some(url) = toml_config.reset_target_url {
            self.reset_target_url = url;
        }
        if let Some(shared) = toml_config.shared_key_space {
            self.shared_key_space = shared;
        }
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("CASTMATCH_MATCHING_URL") {
            self.matching_base_url = url;
        }
        if let Some(secs) = env_u64("CASTMATCH_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(secs);
        }
        if let Some(ms) = env_u64("CASTMATCH_RESET_ACK_TIMEOUT_MS") {
            self.reset_ack_timeout_ms = ms;
        }
        if let Ok(url) = std::env::var("CASTMATCH_RESET_TARGET_URL") {
            self.reset_target_url = url;
        }
        if let Ok(value) = std::env::var("CASTMATCH_SHARED_KEY_SPACE") {
            self.shared_key_space = matches!(value.as_str(), "1" | "true" | "yes");
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(name, raw = %raw, "ignoring non-numeric environment override");
            None
        }
    }
}
