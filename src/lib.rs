//! # Hydra token agent
//!
//! Fetches OAuth2 client-credentials tokens from a Hydra authorization
//! server, caches them per target audience and attaches them to outgoing
//! requests.
//!
//! Modules:
//! - `cache` — per-target token cache with half-lifetime refresh
//! - `sources` — token fetchers (Hydra client-credentials)
//! - `transport` — `reqwest` client with pre-send hooks
//! - `authenticator` — hook that injects the auth header
//! - `config` — YAML service configuration
//! - `observability` — metrics and error reporting

pub mod authenticator;
pub mod cache;
pub mod config;
pub mod error;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod sources;
pub mod tests;
pub mod transport;
pub mod utils;


pub use crate::authenticator::{AuthenticatorOptions, Detach, RequestAuthenticator};
pub use crate::cache::token_cache::{AuthHeaderProvider, TokenCache};
pub use crate::config::sources::HydraConfig;
pub use crate::error::{FetchError, SendError};
pub use crate::sources::hydra::HydraClient;
pub use crate::transport::HookedClient;
