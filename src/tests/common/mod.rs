// shared helpers for the in-crate test modules
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::routing::get;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use http::{HeaderMap, StatusCode};

use crate::cache::token::TokenResponse;
use crate::cache::token_cache::AuthHeaderProvider;
use crate::error::FetchError;
use crate::sources::TokenFetcher;

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const EXPIRES_IN: u64 = 60 * 60; // 1 hour in seconds

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

/// Headers of every request the echo server received.
#[derive(Clone, Default)]
pub struct SeenHeaders(pub Arc<Mutex<Vec<HeaderMap>>>);

impl SeenHeaders {
    pub fn all(&self) -> Vec<HeaderMap> {
        self.0.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<HeaderMap> {
        self.0.lock().unwrap().last().cloned()
    }
}

/// Downstream service that records request headers at `/hydra-endpoint`.
pub async fn spawn_echo_server() -> (JoinHandle<()>, SocketAddr, SeenHeaders) {
    let seen = SeenHeaders::default();
    let router = Router::new()
        .route("/hydra-endpoint", get(record_headers))
        .with_state(seen.clone());
    let (handle, addr) = spawn_axum(router).await;
    (handle, addr, seen)
}

async fn record_headers(State(seen): State<SeenHeaders>, headers: HeaderMap) -> &'static str {
    seen.0.lock().unwrap().push(headers);
    "ok"
}

pub fn basic_auth_header() -> String {
    format!("Basic {}", STANDARD.encode(format!("{}:{}", CLIENT_ID, CLIENT_SECRET)))
}

pub fn token_body(access_token: &str, expires_in: u64) -> serde_json::Value {
    json!({
        "access_token": access_token,
        "expires_in": expires_in,
        "token_type": "client_credentials",
        "scope": "offline",
    })
}

/// Fetcher that hands out `<target>-<n>` tokens and can be switched to fail.
#[derive(Default)]
pub struct StubFetcher {
    issued: AtomicUsize,
    failing: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl TokenFetcher for StubFetcher {
    async fn fetch_token(&self, target: &str) -> Result<TokenResponse, FetchError> {
        self.calls.lock().unwrap().push(target.to_owned());
        if self.failing.load(Ordering::SeqCst) {
            return Err(FetchError::Status {
                target: target.to_owned(),
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: r#"{"error":"server_error"}"#.to_owned(),
            });
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TokenResponse {
            access_token: format!("{}-{}", target, n),
            expires_in_ms: EXPIRES_IN * 1000,
            token_type: "client_credentials".to_owned(),
            scope: "offline".to_owned(),
        })
    }
}

/// Provider with a fixed answer that records which targets were asked for.
pub struct StubProvider {
    header: Option<String>,
    calls: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn returning(header: &str) -> Self {
        Self { header: Some(header.to_owned()), calls: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { header: None, calls: Mutex::new(Vec::new()) }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl AuthHeaderProvider for StubProvider {
    async fn auth_header_for_target(&self, target: &str) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(target.to_owned());
        self.header.clone().ok_or_else(|| FetchError::MalformedResponse {
            target: target.to_owned(),
            reason: "stub failure".to_owned(),
        })
    }
}
