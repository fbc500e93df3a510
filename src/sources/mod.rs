//! Sources module
//!
//! Token sources the cache can draw from. The only production source is the
//! Hydra client-credentials endpoint.

use std::future::Future;

use crate::cache::token::TokenResponse;
use crate::error::FetchError;

pub mod hydra;

/// Obtains a fresh token for a target audience.
///
/// Implementations perform exactly one attempt per call; retry and fallback
/// policy belongs to the cache.
pub trait TokenFetcher: Send + Sync {
    fn fetch_token(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<TokenResponse, FetchError>> + Send;
}
