use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use crate::config::settings::SettingsConfig;
use crate::utils::constants::{DEFAULT_AUTH_HEADER, DEFAULT_HTTP_TIMEOUT_MS, TOKEN_PATH};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub hydra: HydraConfig,
    #[serde(default)]
    pub authenticator: AuthenticatorConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
}

/// ================================
/// Authorization server
/// ================================
#[derive(Deserialize, Clone, PartialEq, Eq)]
pub struct HydraConfig {
    /// base url, e.g. `http://hydra:4444` or `http://example.com/hydra`
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_ms: Option<u64>,
}

impl HydraConfig {
    pub fn new(url: impl Into<String>, client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            timeout_ms: None,
        }
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.unwrap_or(DEFAULT_HTTP_TIMEOUT_MS))
    }

    pub fn token_url(&self) -> String {
        format!("{}{}", self.url.trim_end_matches('/'), TOKEN_PATH)
    }
}

// client_secret stays out of logs
impl fmt::Debug for HydraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HydraConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// ================================
/// Request authenticator
/// ================================
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthenticatorConfig {
    #[serde(default = "default_header_name")]
    pub header_name: String,
}

impl Default for AuthenticatorConfig {
    fn default() -> Self {
        Self { header_name: default_header_name() }
    }
}

fn default_header_name() -> String {
    DEFAULT_AUTH_HEADER.to_owned()
}
