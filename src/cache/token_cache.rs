use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::token::Token;
use crate::error::FetchError;
use crate::helpers::time::{Clock, SystemClock};
use crate::observability::metrics::{
    get_metrics, LOOKUP_FAILED, LOOKUP_FRESH, LOOKUP_REFRESHED, LOOKUP_STALE,
};
use crate::sources::TokenFetcher;

/// Anything that can produce an authorization header value for a target.
pub trait AuthHeaderProvider: Send + Sync {
    fn auth_header_for_target(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Per-target token cache with half-lifetime refresh.
///
/// A cached token is served as is until its refresh point. After that every
/// lookup attempts one fetch; if the fetch fails while the old token has not
/// hit its hard expiry, the old token is served instead of the error.
///
/// Concurrent lookups for the same stale target may each fetch; the last
/// successful fetch wins the slot.
pub struct TokenCache<F, C = SystemClock> {
    store: Arc<RwLock<HashMap<String, Arc<Token>>>>,
    fetcher: Arc<F>,
    clock: Arc<C>,
}

impl<F, C> Clone for TokenCache<F, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            clock: self.clock.clone(),
        }
    }
}

impl<F: TokenFetcher> TokenCache<F, SystemClock> {
    pub fn new(fetcher: F) -> Self {
        Self::with_clock(fetcher, Arc::new(SystemClock))
    }
}

impl<F: TokenFetcher, C: Clock> TokenCache<F, C> {
    pub fn with_clock(fetcher: F, clock: Arc<C>) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            fetcher: Arc::new(fetcher),
            clock,
        }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Current entry for `target`, without fetching.
    pub async fn cached(&self, target: &str) -> Option<Arc<Token>> {
        self.store.read().await.get(target).cloned()
    }

    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    pub async fn auth_header_for_target(&self, target: &str) -> Result<String, FetchError> {
        let metrics = get_metrics().await;
        let cached = self.cached(target).await;

        if let Some(token) = cached.as_ref().filter(|t| !t.must_refresh(self.clock.now_ms())) {
            metrics.token_lookups.with_label_values(&[target, LOOKUP_FRESH]).inc();
            return Ok(token.auth_header.clone());
        }

        if cached.is_some() {
            debug!("token for target '{}' passed its refresh point, fetching a new one", target);
        } else {
            debug!("no cached token for target '{}', fetching", target);
        }

        match self.fetcher.fetch_token(target).await {
            Ok(response) => {
                let token = Arc::new(Token::issue(response, self.clock.now_ms()));
                let header = token.auth_header.clone();
                let expires_at_secs = token.expires_at_ms / 1000;
                let cached_targets = self.store(target, token).await;

                metrics.cached_tokens.set(cached_targets as i64);
                metrics.token_expiry_unix.with_label_values(&[target]).set(expires_at_secs);
                metrics.token_lookups.with_label_values(&[target, LOOKUP_REFRESHED]).inc();
                Ok(header)
            }
            Err(err) => match cached.filter(|t| !t.is_expired(self.clock.now_ms())) {
                Some(stale) => {
                    warn!(
                        "refresh for target '{}' failed, serving cached token until {}: {}",
                        target, stale.expires_at_ms, err
                    );
                    metrics.token_lookups.with_label_values(&[target, LOOKUP_STALE]).inc();
                    Ok(stale.auth_header.clone())
                }
                None => {
                    metrics.token_lookups.with_label_values(&[target, LOOKUP_FAILED]).inc();
                    Err(err)
                }
            },
        }
    }

    /// Returns the number of cached targets after the insert.
    async fn store(&self, target: &str, token: Arc<Token>) -> usize {
        let mut map = self.store.write().await;
        map.insert(target.to_owned(), token);
        map.len()
    }
}

impl<F: TokenFetcher, C: Clock> AuthHeaderProvider for TokenCache<F, C> {
    fn auth_header_for_target(
        &self,
        target: &str,
    ) -> impl Future<Output = Result<String, FetchError>> + Send {
        TokenCache::auth_header_for_target(self, target)
    }
}
