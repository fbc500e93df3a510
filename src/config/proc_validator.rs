//! Configuration validation with aggregated errors.
//! Every issue is collected into a `Vec<String>` so a broken config is
//! reported in one go instead of one error per restart.

use http::HeaderName;
use tracing::{error, info};

use crate::config::settings::{LoggingConfig, MetricsConfig, SettingsConfig};
use crate::config::sources::{AuthenticatorConfig, HydraConfig, ServiceConfig};
use crate::observability::metrics::get_metrics;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_hydra(&cfg.hydra, &mut errors);
    validate_authenticator(&cfg.authenticator, &mut errors);
    validate_settings(&cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config valid");
        Ok(())
    } else {
        error!("configuration validation errors ({}):", errors.len());
        for e in &errors {
            error!(" - {}", e);
        }
        get_metrics().await.config_validation_errors.inc_by(errors.len() as u64);
        Err(errors)
    }
}

/// HYDRA VALIDATION
fn validate_hydra(hydra: &HydraConfig, errors: &mut Vec<String>) {
    match reqwest::Url::parse(&hydra.url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        Ok(url) => errors.push(format!(
            "hydra.url '{}' must use http or https, got '{}'",
            hydra.url,
            url.scheme()
        )),
        Err(e) => errors.push(format!("hydra.url '{}' is not a valid url: {}", hydra.url, e)),
    }
    if hydra.client_id.trim().is_empty() {
        errors.push("hydra.client_id must not be empty".to_string());
    }
    if hydra.client_secret.is_empty() {
        errors.push("hydra.client_secret must not be empty".to_string());
    }
    if hydra.timeout_ms == Some(0) {
        errors.push("hydra.timeout_ms must be greater than 0".to_string());
    }
}

/// AUTHENTICATOR VALIDATION
fn validate_authenticator(authenticator: &AuthenticatorConfig, errors: &mut Vec<String>) {
    if HeaderName::from_bytes(authenticator.header_name.as_bytes()).is_err() {
        errors.push(format!(
            "authenticator.header_name '{}' is not a valid HTTP header name",
            authenticator.header_name
        ));
    }
}

/// SETTINGS VALIDATION
fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if let Some(logging) = &settings.logging {
        validate_logging(logging, errors);
    }
    validate_metrics(&settings.metrics, errors);

    if settings.server.host.is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.port.parse::<u16>().is_err() {
        errors.push(format!(
            "settings.server.port '{}' must be a valid port number",
            settings.server.port
        ));
    }
}

fn validate_logging(logging: &LoggingConfig, errors: &mut Vec<String>) {
    if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
        errors.push(format!(
            "settings.logging.level '{}' must be one of {:?}",
            logging.level, LOG_LEVELS
        ));
    }
}

fn validate_metrics(metrics: &MetricsConfig, errors: &mut Vec<String>) {
    if !metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must be absolute (start with '/')",
            metrics.path
        ));
    }
}
