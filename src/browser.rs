//! Cache API and fetch bindings for the offline cache manager inside a
//! service worker.

use crate::offline::{CacheStorage, HostResponse, Network, Request, ResponseKind};
use crate::CacheError;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Cache, ResponseType, WorkerGlobalScope};

/// Best-effort message text for a thrown JS value.
pub fn describe_js(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value.as_string().unwrap_or_else(|| format!("{:?}", value))
}

fn storage_error(cache: &str, value: &JsValue) -> CacheError {
    CacheError::Storage {
        cache: cache.to_string(),
        reason: describe_js(value),
    }
}

pub struct BrowserResponse(web_sys::Response);

impl BrowserResponse {
    pub fn into_inner(self) -> web_sys::Response {
        self.0
    }
}

impl HostResponse for BrowserResponse {
    fn status(&self) -> u16 {
        self.0.status()
    }

    fn kind(&self) -> ResponseKind {
        match self.0.type_() {
            ResponseType::Basic => ResponseKind::Basic,
            ResponseType::Cors => ResponseKind::Cors,
            ResponseType::Default => ResponseKind::Default,
            ResponseType::Opaque | ResponseType::Opaqueredirect => ResponseKind::Opaque,
            _ => ResponseKind::Error,
        }
    }

    fn try_clone(&self) -> Result<Self, CacheError> {
        // Inherent `Response.clone()`, which tees the body
        self.0
            .clone()
            .map(BrowserResponse)
            .map_err(|e| CacheError::Host(describe_js(&e)))
    }
}

/// `self.caches` of the worker.
pub struct BrowserCacheStorage {
    caches: web_sys::CacheStorage,
}

impl BrowserCacheStorage {
    pub fn new(caches: web_sys::CacheStorage) -> Self {
        Self { caches }
    }

    async fn open_cache(&self, name: &str) -> Result<Cache, CacheError> {
        let value = JsFuture::from(self.caches.open(name))
            .await
            .map_err(|e| storage_error(name, &e))?;
        value.dyn_into::<Cache>().map_err(|e| storage_error(name, &e))
    }
}

impl CacheStorage for BrowserCacheStorage {
    type Response = BrowserResponse;

    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.open_cache(name).await.map(|_| ())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let value = JsFuture::from(self.caches.keys())
            .await
            .map_err(|e| storage_error("*", &e))?;
        Ok(js_sys::Array::from(&value)
            .iter()
            .filter_map(|name| name.as_string())
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        let value = JsFuture::from(self.caches.delete(name))
            .await
            .map_err(|e| storage_error(name, &e))?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<BrowserResponse>, CacheError> {
        let cache = self.open_cache(name).await?;
        let value = JsFuture::from(cache.match_with_str(key))
            .await
            .map_err(|e| storage_error(name, &e))?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        value
            .dyn_into::<web_sys::Response>()
            .map(|r| Some(BrowserResponse(r)))
            .map_err(|e| storage_error(name, &e))
    }

    async fn put(&self, name: &str, key: &str, response: BrowserResponse) -> Result<(), CacheError> {
        let cache = self.open_cache(name).await?;
        JsFuture::from(cache.put_with_str(key, &response.0))
            .await
            .map_err(|e| storage_error(name, &e))?;
        Ok(())
    }
}

/// Plain `fetch()` from the worker scope.
pub struct BrowserNetwork {
    scope: WorkerGlobalScope,
}

impl BrowserNetwork {
    pub fn new(scope: WorkerGlobalScope) -> Self {
        Self { scope }
    }

    /// Send a host request on untouched, keeping its method, headers and
    /// body.
    pub async fn forward(&self, request: &web_sys::Request) -> Result<JsValue, CacheError> {
        JsFuture::from(self.scope.fetch_with_request(request))
            .await
            .map_err(|e| CacheError::Network {
                url: request.url(),
                reason: describe_js(&e),
            })
    }
}

impl Network for BrowserNetwork {
    type Response = BrowserResponse;

    async fn fetch(&self, request: &Request) -> Result<BrowserResponse, CacheError> {
        let network_error = |e: JsValue| CacheError::Network {
            url: request.url.clone(),
            reason: describe_js(&e),
        };
        let value = JsFuture::from(self.scope.fetch_with_str(&request.url))
            .await
            .map_err(network_error)?;
        value
            .dyn_into::<web_sys::Response>()
            .map(BrowserResponse)
            .map_err(|e| CacheError::Host(describe_js(&e)))
    }
}
