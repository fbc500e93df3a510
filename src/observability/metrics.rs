use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const LOOKUP_FRESH: &str = "fresh";
pub const LOOKUP_REFRESHED: &str = "refreshed";
pub const LOOKUP_STALE: &str = "stale";
pub const LOOKUP_FAILED: &str = "failed";

pub const HOOK_ATTACHED: &str = "attached";
pub const HOOK_SKIPPED: &str = "skipped";
pub const HOOK_FAILED: &str = "failed";

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the process-wide metrics.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}

/// Metrics if already initialized, for call sites that cannot await.
pub fn try_metrics() -> Option<&'static Arc<Metrics>> {
    METRICS_INSTANCE.get()
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Authorization server
    pub token_fetch_requests: IntCounterVec,
    pub token_fetch_failures: IntCounterVec,
    pub token_fetch_duration: HistogramVec,

    // Cache
    pub token_lookups: IntCounterVec,
    pub cached_tokens: IntGauge,
    pub token_expiry_unix: IntGaugeVec,

    // Authenticator hook
    pub authenticator_requests: IntCounterVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("hydratoken".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // Authorization server
            token_fetch_requests: IntCounterVec::new(Opts::new("token_fetch_requests_total","Token requests sent to the authorization server",),&["target"],).unwrap(),
            token_fetch_failures: IntCounterVec::new(Opts::new("token_fetch_failures_total", "Token request failures by reason"),&["target", "reason"],).unwrap(),
            token_fetch_duration: HistogramVec::new(HistogramOpts::new("token_fetch_duration_seconds", "Token request duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["target"],).unwrap(),

            // Cache
            token_lookups: IntCounterVec::new(Opts::new("token_lookups_total", "Auth header lookups by outcome"),&["target", "outcome"],).unwrap(),
            cached_tokens: IntGauge::new("cached_tokens", "Targets with a cached token").unwrap(),
            token_expiry_unix: IntGaugeVec::new(Opts::new("token_expiry_unix_seconds", "Hard expiry of the cached token"),&["target"],).unwrap(),

            // Authenticator hook
            authenticator_requests: IntCounterVec::new(Opts::new("authenticator_requests_total", "Outgoing requests seen by the authenticator hook"),&["target", "outcome"],).unwrap(),

            // Config/runtime
            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.token_fetch_requests.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_failures.clone())).unwrap();
        reg.register(Box::new(metrics.token_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.token_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.cached_tokens.clone())).unwrap();
        reg.register(Box::new(metrics.token_expiry_unix.clone())).unwrap();
        reg.register(Box::new(metrics.authenticator_requests.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
