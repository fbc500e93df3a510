use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use tracing::{info, warn};

use crate::cache::token_cache::TokenCache;
use crate::config::settings::SettingsConfig;
use crate::helpers::time::Clock;
use crate::server::server;
use crate::sources::TokenFetcher;

/// Looks `target` up every `interval`, forever. Logs when the cached token
/// changes and when no usable token could be produced.
pub async fn keep_warm<F: TokenFetcher, C: Clock>(cache: &TokenCache<F, C>, target: &str, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    let mut last_header: Option<String> = None;
    loop {
        ticker.tick().await;
        match cache.auth_header_for_target(target).await {
            Ok(header) => {
                if last_header.as_deref() != Some(header.as_str()) {
                    let refresh_at = cache.cached(target).await.map(|t| t.refresh_at_ms);
                    info!("token for target '{}' rotated, next refresh at {:?} ms", target, refresh_at);
                    last_header = Some(header);
                }
            }
            Err(e) => warn!("no usable token for target '{}': {}", target, e),
        }
    }
}

/// Keeps `target` warm and, when enabled, serves metrics next to it.
/// Returns once `shutdown` resolves or the metrics server fails.
pub async fn run_watch<F, C, S>(
    cache: &TokenCache<F, C>,
    target: &str,
    interval: Duration,
    settings: &SettingsConfig,
    shutdown: S,
) -> Result<()>
where
    F: TokenFetcher,
    C: Clock,
    S: Future<Output = ()>,
{
    let metrics_server = async {
        if settings.metrics.is_enabled {
            server::start(settings).await
        } else {
            info!("metrics endpoint disabled");
            std::future::pending().await
        }
    };

    tokio::select! {
        _ = keep_warm(cache, target, interval) => Ok(()),
        res = metrics_server => res,
        _ = shutdown => {
            info!("stopping watch for target '{}'", target);
            Ok(())
        }
    }
}
