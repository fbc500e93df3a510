use std::sync::Arc;

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::cache::token::TokenResponse;
use crate::config::sources::HydraConfig;
use crate::error::FetchError;
use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::observability::reporter::{ErrorReporter, NoopReporter};
use crate::sources::TokenFetcher;
use crate::utils::constants::GRANT_TYPE_CLIENT_CREDENTIALS;

/// Client-credentials token source backed by a Hydra authorization server.
#[derive(Clone)]
pub struct HydraClient {
    config: Arc<HydraConfig>,
    client: Client,
    reporter: Arc<dyn ErrorReporter>,
}

impl HydraClient {
    pub fn new(config: HydraConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: Client::new(),
            reporter: Arc::new(NoopReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Reuse an existing connection pool instead of a dedicated one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn config(&self) -> &HydraConfig {
        &self.config
    }

    async fn request_token(&self, target: &str) -> Result<TokenResponse, FetchError> {
        let form = [
            ("grant_type", GRANT_TYPE_CLIENT_CREDENTIALS),
            ("audience", target),
        ];

        let response = self
            .client
            .post(self.config.token_url())
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .timeout(self.config.timeout())
            .form(&form)
            .send()
            .await
            .map_err(|source| FetchError::Transport { target: target.to_owned(), source })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| FetchError::Transport { target: target.to_owned(), source })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                target: target.to_owned(),
                status,
                body: serialize_error_body(&body),
            });
        }

        parse_token_response(target, &body)
    }
}

impl TokenFetcher for HydraClient {
    async fn fetch_token(&self, target: &str) -> Result<TokenResponse, FetchError> {
        let metrics = get_metrics().await;
        let start = get_instant();
        metrics.token_fetch_requests.with_label_values(&[target]).inc();
        debug!("requesting token for target '{}' from {}", target, self.config.url);

        let result = self.request_token(target).await;
        metrics.token_fetch_duration.with_label_values(&[target]).observe(start.elapsed().as_secs_f64());

        result.inspect_err(|err| {
            metrics.token_fetch_failures.with_label_values(&[target, err.reason()]).inc();
            self.reporter.error(&format!(
                "error during call hydra for: {} err: {}",
                target,
                err.detail()
            ));
        })
    }
}

fn parse_token_response(target: &str, body: &str) -> Result<TokenResponse, FetchError> {
    let token: TokenResponse = serde_json::from_str(body).map_err(|err| FetchError::MalformedResponse {
        target: target.to_owned(),
        reason: err.to_string(),
    })?;

    if token.access_token.is_empty() {
        return Err(FetchError::MalformedResponse {
            target: target.to_owned(),
            reason: "empty access_token".to_owned(),
        });
    }
    Ok(token)
}

/// JSON bodies are re-serialized compactly, anything else is kept verbatim.
fn serialize_error_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string(&value).ok())
        .unwrap_or_else(|| body.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_json_is_compacted() {
        let body = "{\n  \"error\": \"server_error\",\n  \"error_description\": \"boom\"\n}";
        assert_eq!(
            serialize_error_body(body),
            r#"{"error":"server_error","error_description":"boom"}"#
        );
    }

    #[test]
    fn error_body_text_is_kept() {
        assert_eq!(serialize_error_body(" bad gateway \n"), "bad gateway");
        assert_eq!(serialize_error_body(""), "");
    }

    #[test]
    fn missing_access_token_is_malformed() {
        let err = parse_token_response("t", r#"{"expires_in":60}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
        assert_eq!(err.target(), "t");
    }

    #[test]
    fn empty_access_token_is_malformed() {
        let err = parse_token_response("t", r#"{"access_token":"","expires_in":60}"#).unwrap_err();
        assert_eq!(err.detail(), "empty access_token");
    }

    #[test]
    fn full_response_parses() {
        let token = parse_token_response(
            "t",
            r#"{"access_token":"abc","expires_in":3600,"token_type":"bearer","scope":"read"}"#,
        )
        .unwrap();
        assert_eq!(token.access_token, "abc");
        assert_eq!(token.expires_in_ms, 3_600_000);
        assert_eq!(token.scope, "read");
    }

    #[test]
    fn negative_lifetime_is_malformed() {
        let err = parse_token_response("t", r#"{"access_token":"abc","expires_in":-5}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse { .. }));
        assert!(err.detail().contains("non-negative"));
    }
}
