//! Hook point around `reqwest::Client`.
//!
//! reqwest has no request interceptors, so outgoing requests go through
//! [`HookedClient`], which runs every registered [`RequestHook`] on the built
//! request before handing it to the client.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::{Client, IntoUrl, Method, Request, RequestBuilder, Response};
use tracing::debug;

use crate::error::SendError;

/// Runs before a request is sent and may rewrite it.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Checked for every request; `before_send` only runs when this is true.
    fn should_run(&self, _request: &Request) -> bool {
        true
    }

    /// An error aborts the send; the request never reaches the network.
    async fn before_send(&self, request: &mut Request) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

#[derive(Default)]
pub(crate) struct HookRegistry {
    next_id: AtomicU64,
    hooks: RwLock<Vec<(HookId, Arc<dyn RequestHook>)>>,
}

impl HookRegistry {
    fn register(&self, hook: Arc<dyn RequestHook>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.hooks
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, hook));
        id
    }

    pub(crate) fn unregister(&self, id: HookId) -> bool {
        let mut hooks = self.hooks.write().unwrap_or_else(PoisonError::into_inner);
        let before = hooks.len();
        hooks.retain(|(hook_id, _)| *hook_id != id);
        hooks.len() != before
    }

    fn snapshot(&self) -> Vec<Arc<dyn RequestHook>> {
        self.hooks
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, hook)| hook.clone())
            .collect()
    }

    fn len(&self) -> usize {
        self.hooks.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// `reqwest::Client` with pre-send hooks. Clones share hooks and the
/// connection pool.
#[derive(Clone, Default)]
pub struct HookedClient {
    client: Client,
    hooks: Arc<HookRegistry>,
}

impl HookedClient {
    pub fn new(client: Client) -> Self {
        Self { client, hooks: Arc::new(HookRegistry::default()) }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn request<U: IntoUrl>(&self, method: Method, url: U) -> RequestBuilder {
        self.client.request(method, url)
    }

    pub fn get<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post<U: IntoUrl>(&self, url: U) -> RequestBuilder {
        self.client.post(url)
    }

    /// Hooks run in registration order; each one sees the changes made by
    /// the previous ones.
    pub fn register(&self, hook: Arc<dyn RequestHook>) -> HookId {
        self.hooks.register(hook)
    }

    pub fn unregister(&self, id: HookId) -> bool {
        self.hooks.unregister(id)
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    pub(crate) fn registry(&self) -> &Arc<HookRegistry> {
        &self.hooks
    }

    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, SendError> {
        self.execute(builder.build()?).await
    }

    pub async fn execute(&self, mut request: Request) -> Result<Response, SendError> {
        // hooks attached or detached while this request is in flight
        // only affect later requests
        for hook in self.hooks.snapshot() {
            if hook.should_run(&request) {
                hook.before_send(&mut request).await.map_err(SendError::Hook)?;
            }
        }
        debug!("{} {}", request.method(), request.url());
        Ok(self.client.execute(request).await?)
    }
}
