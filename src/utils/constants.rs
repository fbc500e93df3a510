//! Shared constants and invariants

pub const DEFAULT_HTTP_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_AUTH_HEADER: &str = "Proxy-Authorization";
pub const TOKEN_PATH: &str = "/oauth2/token";
pub const GRANT_TYPE_CLIENT_CREDENTIALS: &str = "client_credentials";

pub const DEFAULT_CONFIG_PATH: &str = "hydra-token.yaml";
pub const DEFAULT_METRICS_PATH: &str = "/metrics";
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";
pub const DEFAULT_SERVER_PORT: &str = "9100";
