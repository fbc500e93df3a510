use anyhow::{Context, Result};
use tracing::info;
use crate::config::settings::SettingsConfig;
use crate::observability::metrics::get_metrics;
use crate::observability::routes::MetricsState;

/// Serve the prometheus endpoint until the process stops. Returns right away
/// when metrics are disabled.
pub async fn start(settings_config: &SettingsConfig) -> Result<()> {
    if !settings_config.metrics.is_enabled {
        info!("metrics endpoint disabled");
        return Ok(());
    }

    let metrics = get_metrics().await;
    let app = MetricsState::new(metrics.registry.clone()).router(&settings_config.metrics);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("cannot bind metrics server to {}", bind_addr))?;
    info!("serving {} on {}", settings_config.metrics.path, bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app).await.context("metrics server failed")?;
    Ok(())
}
