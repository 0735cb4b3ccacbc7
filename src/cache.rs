//! In-memory cache storage and network for running the offline cache
//! manager outside a browser.
//!
//! Both types are cheap `Rc` handles: clone one, hand it to the
//! [`OfflineCache`](crate::offline::OfflineCache), and keep the other to
//! inspect or script what happened.
//!
//! # Store Structure
//! - outer key: cache store name (the generation)
//! - inner key: request key, see [`cache_key`](crate::utils::cache_key)
//! - value: [`MemoryResponse`]

use crate::offline::{CacheStorage, HostResponse, Network, Request, ResponseKind};
use crate::CacheError;
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

/// Store name -> (request key -> response). `BTreeMap` keeps `keys()`
/// ordering stable.
type StoreMap = BTreeMap<String, BTreeMap<String, MemoryResponse>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryResponse {
    status: u16,
    kind: ResponseKind,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl MemoryResponse {
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, body)
    }

    pub fn with_status(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            kind: ResponseKind::Basic,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// A no-cors cross-origin response: status 0, nothing readable.
    pub fn opaque() -> Self {
        Self {
            status: 0,
            kind: ResponseKind::Opaque,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

impl HostResponse for MemoryResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn kind(&self) -> ResponseKind {
        self.kind
    }

    fn try_clone(&self) -> Result<Self, CacheError> {
        Ok(self.clone())
    }
}

#[derive(Default)]
struct StorageState {
    stores: RefCell<StoreMap>,
    fail_reads: Cell<bool>,
    fail_writes: Cell<bool>,
    fail_opens: Cell<bool>,
}

/// Cache storage kept entirely in memory.
#[derive(Clone, Default)]
pub struct MemoryCacheStorage {
    state: Rc<StorageState>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put an entry directly, bypassing the manager (e.g. a leftover
    /// generation from a previous deployment).
    pub fn seed(&self, store: &str, key: &str, response: MemoryResponse) {
        self.state
            .stores
            .borrow_mut()
            .entry(store.to_string())
            .or_default()
            .insert(key.to_string(), response);
    }

    pub fn store_names(&self) -> Vec<String> {
        self.state.stores.borrow().keys().cloned().collect()
    }

    pub fn entry_keys(&self, store: &str) -> Vec<String> {
        self.state
            .stores
            .borrow()
            .get(store)
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn entry(&self, store: &str, key: &str) -> Option<MemoryResponse> {
        self.state
            .stores
            .borrow()
            .get(store)
            .and_then(|entries| entries.get(key).cloned())
    }

    /// Make every lookup fail until switched off again.
    pub fn fail_reads(&self, fail: bool) {
        self.state.fail_reads.set(fail);
    }

    /// Make every put fail until switched off again.
    pub fn fail_writes(&self, fail: bool) {
        self.state.fail_writes.set(fail);
    }

    /// Make every open fail until switched off again.
    pub fn fail_opens(&self, fail: bool) {
        self.state.fail_opens.set(fail);
    }
}

impl CacheStorage for MemoryCacheStorage {
    type Response = MemoryResponse;

    async fn open(&self, name: &str) -> Result<(), CacheError> {
        if self.state.fail_opens.get() {
            return Err(CacheError::Storage {
                cache: name.to_string(),
                reason: "open refused".to_string(),
            });
        }
        self.state
            .stores
            .borrow_mut()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.store_names())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.state.stores.borrow_mut().remove(name).is_some())
    }

    async fn lookup(&self, name: &str, key: &str) -> Result<Option<MemoryResponse>, CacheError> {
        if self.state.fail_reads.get() {
            return Err(CacheError::Storage {
                cache: name.to_string(),
                reason: "read refused".to_string(),
            });
        }
        Ok(self.entry(name, key))
    }

    async fn put(&self, name: &str, key: &str, response: MemoryResponse) -> Result<(), CacheError> {
        if self.state.fail_writes.get() {
            return Err(CacheError::Storage {
                cache: name.to_string(),
                reason: "quota exceeded".to_string(),
            });
        }
        self.seed(name, key, response);
        Ok(())
    }
}

#[derive(Default)]
struct NetworkState {
    routes: RefCell<HashMap<String, MemoryResponse>>,
    offline: Cell<bool>,
    calls: Cell<usize>,
}

/// Scripted network: exact-URL routes, unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MemoryNetwork {
    state: Rc<NetworkState>,
}

impl MemoryNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, url: &str, response: MemoryResponse) {
        self.state
            .routes
            .borrow_mut()
            .insert(url.to_string(), response);
    }

    pub fn set_offline(&self, offline: bool) {
        self.state.offline.set(offline);
    }

    /// Number of fetches attempted, including failed ones.
    pub fn calls(&self) -> usize {
        self.state.calls.get()
    }
}

impl Network for MemoryNetwork {
    type Response = MemoryResponse;

    async fn fetch(&self, request: &Request) -> Result<MemoryResponse, CacheError> {
        self.state.calls.set(self.state.calls.get() + 1);
        if self.state.offline.get() {
            return Err(CacheError::Network {
                url: request.url.clone(),
                reason: "offline".to_string(),
            });
        }
        Ok(self
            .state
            .routes
            .borrow()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| MemoryResponse::with_status(404, "Not Found")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;

    #[test]
    fn handles_share_state() {
        let storage = MemoryCacheStorage::new();
        let other = storage.clone();
        block_on(storage.put("v1", "/a", MemoryResponse::ok("a"))).unwrap();
        assert_eq!(other.entry_keys("v1"), vec!["/a".to_string()]);
    }

    #[test]
    fn lookup_in_missing_store_does_not_create_it() {
        let storage = MemoryCacheStorage::new();
        assert_eq!(block_on(storage.lookup("v1", "/a")).unwrap(), None);
        assert!(storage.store_names().is_empty());
    }

    #[test]
    fn delete_reports_whether_store_existed() {
        let storage = MemoryCacheStorage::new();
        block_on(storage.open("v1")).unwrap();
        assert!(block_on(storage.delete("v1")).unwrap());
        assert!(!block_on(storage.delete("v1")).unwrap());
    }

    #[test]
    fn unknown_routes_answer_not_found() {
        let network = MemoryNetwork::new();
        let response = block_on(network.fetch(&Request::get("/nope"))).unwrap();
        assert_eq!(response.status(), 404);
        assert_eq!(network.calls(), 1);
    }
}
