//! Request authenticator: attaches a target's auth header to matching
//! outgoing requests of a [`HookedClient`].

use std::sync::{Arc, Weak};

use anyhow::Context;
use async_trait::async_trait;
use http::header::PROXY_AUTHORIZATION;
use http::{HeaderName, HeaderValue};
use reqwest::Request;
use tracing::debug;

use crate::cache::token_cache::AuthHeaderProvider;
use crate::observability::metrics::{get_metrics, try_metrics, HOOK_ATTACHED, HOOK_FAILED, HOOK_SKIPPED};
use crate::transport::{HookId, HookRegistry, HookedClient, RequestHook};

pub type ShouldRun = Arc<dyn Fn(&Request) -> bool + Send + Sync>;

pub struct AuthenticatorOptions<P> {
    pub header_name: HeaderName,
    pub provider: Arc<P>,
    pub target: String,
    pub should_run: ShouldRun,
}

impl<P> AuthenticatorOptions<P> {
    /// Header defaults to `Proxy-Authorization`.
    pub fn new<F>(provider: Arc<P>, target: impl Into<String>, should_run: F) -> Self
    where
        F: Fn(&Request) -> bool + Send + Sync + 'static,
    {
        Self {
            header_name: PROXY_AUTHORIZATION,
            provider,
            target: target.into(),
            should_run: Arc::new(should_run),
        }
    }

    pub fn header_name(mut self, header_name: HeaderName) -> Self {
        self.header_name = header_name;
        self
    }
}

pub struct RequestAuthenticator<P> {
    header_name: HeaderName,
    provider: Arc<P>,
    target: String,
    should_run: ShouldRun,
}

impl<P: AuthHeaderProvider + 'static> RequestAuthenticator<P> {
    /// Registers the authenticator on `transport`. The hook stays until the
    /// returned handle is detached.
    pub fn attach(transport: &HookedClient, options: AuthenticatorOptions<P>) -> Detach {
        let AuthenticatorOptions { header_name, provider, target, should_run } = options;
        debug!("attaching authenticator for target '{}' as header '{}'", target, header_name);

        let hook = Arc::new(Self { header_name, provider, target, should_run });
        let id = transport.register(hook);
        Detach { registry: Arc::downgrade(transport.registry()), id }
    }
}

#[async_trait]
impl<P: AuthHeaderProvider + 'static> RequestHook for RequestAuthenticator<P> {
    fn should_run(&self, request: &Request) -> bool {
        let run = (self.should_run)(request);
        if !run {
            // sync path, so only counted once the registry exists
            if let Some(metrics) = try_metrics() {
                metrics.authenticator_requests.with_label_values(&[self.target.as_str(), HOOK_SKIPPED]).inc();
            }
        }
        run
    }

    async fn before_send(&self, request: &mut Request) -> anyhow::Result<()> {
        let metrics = get_metrics().await;
        let header = match self.provider.auth_header_for_target(&self.target).await {
            Ok(header) => header,
            Err(err) => {
                metrics.authenticator_requests.with_label_values(&[self.target.as_str(), HOOK_FAILED]).inc();
                return Err(err.into());
            }
        };

        let mut value = HeaderValue::from_str(&header)
            .with_context(|| format!("auth header for target '{}' is not a valid header value", self.target))?;
        value.set_sensitive(true);
        request.headers_mut().insert(self.header_name.clone(), value);

        metrics.authenticator_requests.with_label_values(&[self.target.as_str(), HOOK_ATTACHED]).inc();
        Ok(())
    }
}

/// Handle returned by [`RequestAuthenticator::attach`].
#[derive(Debug)]
pub struct Detach {
    registry: Weak<HookRegistry>,
    id: HookId,
}

impl Detach {
    pub fn id(&self) -> HookId {
        self.id
    }

    /// Unregisters the hook. Returns false if it was already gone.
    pub fn detach(self) -> bool {
        self.registry
            .upgrade()
            .map(|registry| registry.unregister(self.id))
            .unwrap_or(false)
    }
}
