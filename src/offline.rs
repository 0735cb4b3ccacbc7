//! Offline cache manager driven by the service worker lifecycle.
//!
//! The manager keeps exactly one cache generation alive. It knows nothing
//! about the browser: storage and network are reached through the
//! [`CacheStorage`] and [`Network`] traits, so the same policy runs against
//! the real Cache API inside the worker and against in-memory substitutes
//! in tests.
//!
//! # Lifecycle
//! 1. `install`: fetch the whole manifest, then write it into the store
//!    named after the current generation. All or nothing.
//! 2. `activate`: delete every store whose name is not the current
//!    generation.
//! 3. `respond`: cache first, then network with write-through, then the
//!    offline fallback document.

use crate::config;
use crate::utils::{cache_key, is_same_origin, is_trusted_origin, origin_of};
use crate::CacheError;
use futures::future::{join_all, try_join_all};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

/// How the host classified a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResponseKind {
    Basic,
    Cors,
    Default,
    /// Cross-origin response whose body and status are unreadable
    Opaque,
    Error,
}

/// A response handle owned by the host runtime.
pub trait HostResponse: Sized {
    fn status(&self) -> u16;
    fn kind(&self) -> ResponseKind;
    /// Duplicate the response so one copy can be stored while the other is
    /// returned. Bodies are single-use, hence fallible.
    fn try_clone(&self) -> Result<Self, CacheError>;
}

/// Named cache stores, each mapping request keys to responses.
#[allow(async_fn_in_trait)]
pub trait CacheStorage {
    type Response: HostResponse;

    /// Open the named store, creating it when missing.
    async fn open(&self, name: &str) -> Result<(), CacheError>;
    async fn keys(&self) -> Result<Vec<String>, CacheError>;
    /// Returns whether a store was actually removed.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;
    async fn lookup(&self, name: &str, key: &str) -> Result<Option<Self::Response>, CacheError>;
    async fn put(&self, name: &str, key: &str, response: Self::Response)
        -> Result<(), CacheError>;
}

#[allow(async_fn_in_trait)]
pub trait Network {
    type Response: HostResponse;

    /// Fails only when no response arrived at all. HTTP error statuses are
    /// still `Ok`.
    async fn fetch(&self, request: &Request) -> Result<Self::Response, CacheError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub method: String,
    pub url: String,
}

impl Request {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

/// Configuration for the offline cache manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OfflineConfig {
    /// Name of the one cache store that survives activation
    pub generation: String,
    /// Origin the worker is served from, e.g. `https://me.dev`. Empty in
    /// the default config: the worker fills it from its own location before
    /// building the cache, and `validate` rejects it while still empty.
    pub origin: String,
    pub manifest: Vec<String>,
    pub trusted_origins: Vec<String>,
    /// Served from the cache when the network is unreachable
    pub fallback_document: Option<String>,
}

impl Default for OfflineConfig {
    fn default() -> Self {
        Self {
            generation: config::CACHE_GENERATION.to_string(),
            origin: String::new(),
            manifest: config::PRECACHE_MANIFEST.iter().map(|s| s.to_string()).collect(),
            trusted_origins: config::TRUSTED_ORIGINS.iter().map(|s| s.to_string()).collect(),
            fallback_document: Some(config::FALLBACK_DOCUMENT.to_string()),
        }
    }
}

impl OfflineConfig {
    pub fn from_json(json: &str) -> Result<Self, CacheError> {
        serde_json::from_str(json).map_err(|e| CacheError::InvalidConfig(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), CacheError> {
        if self.generation.trim().is_empty() {
            return Err(CacheError::InvalidConfig(
                "cache generation must not be empty".to_string(),
            ));
        }
        if self.origin.is_empty() {
            return Err(CacheError::InvalidConfig(
                "origin must be set before use".to_string(),
            ));
        }
        if origin_of(&self.origin) != Some(self.origin.as_str()) {
            return Err(CacheError::InvalidConfig(format!(
                "'{}' is not a bare origin",
                self.origin
            )));
        }
        if let Some(bad) = self
            .trusted_origins
            .iter()
            .find(|o| origin_of(o) != Some(o.as_str()))
        {
            return Err(CacheError::InvalidConfig(format!(
                "trusted origin '{}' is not a bare origin",
                bad
            )));
        }
        Ok(())
    }
}

/// Result of intercepting a request.
#[derive(Debug)]
pub enum FetchOutcome<R> {
    /// Not ours to handle; the host performs the request untouched
    Passthrough,
    Respond(R),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationReport {
    pub kept: String,
    pub deleted: Vec<String>,
}

/// Only complete, readable responses are stored.
#[inline]
pub fn is_cacheable<R: HostResponse>(response: &R) -> bool {
    response.status() == 200
        && matches!(
            response.kind(),
            ResponseKind::Basic | ResponseKind::Cors | ResponseKind::Default
        )
}

pub struct OfflineCache<S, N> {
    config: OfflineConfig,
    storage: S,
    network: N,
}

impl<S, N> OfflineCache<S, N>
where
    S: CacheStorage,
    N: Network<Response = S::Response>,
{
    pub fn new(config: OfflineConfig, storage: S, network: N) -> Result<Self, CacheError> {
        config.validate()?;
        Ok(Self {
            config,
            storage,
            network,
        })
    }

    pub fn config(&self) -> &OfflineConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    fn generation(&self) -> &str {
        &self.config.generation
    }

    fn key_for(&self, url: &str) -> String {
        cache_key(url, &self.config.origin)
    }

    /// Precache the manifest into the current generation.
    ///
    /// Every entry is fetched before anything is written, so a failed
    /// install never leaves a partially filled new generation behind. When
    /// the generation already exists it stays in place on failure. Returns
    /// the number of entries stored.
    pub async fn install(&self) -> Result<usize, CacheError> {
        let generation = self.generation();
        info!(
            "Installing cache generation '{}' ({} entries)",
            generation,
            self.config.manifest.len()
        );

        let fetched = try_join_all(self.config.manifest.iter().map(|entry| async move {
            let response = self.network.fetch(&Request::get(entry.as_str())).await?;
            if !is_cacheable(&response) {
                return Err(CacheError::InstallRejected {
                    url: entry.clone(),
                    status: response.status(),
                });
            }
            Ok((self.key_for(entry), response))
        }))
        .await
        .map_err(|err| {
            error!("Install of '{}' aborted: {}", generation, err);
            err
        })?;

        // A redeploy under the same name installs over the live store
        let existed = self
            .storage
            .keys()
            .await
            .map(|names| names.iter().any(|name| name == generation))
            .map_err(|err| {
                error!("Install of '{}' could not list stores: {}", generation, err);
                err
            })?;
        self.storage.open(generation).await.map_err(|err| {
            error!("Install of '{}' could not open store: {}", generation, err);
            err
        })?;

        let count = fetched.len();
        for (key, response) in fetched {
            if let Err(err) = self.storage.put(generation, &key, response).await {
                error!("Install of '{}' failed writing {}: {}", generation, key, err);
                if existed {
                    warn!("Keeping live store '{}' after failed install", generation);
                } else if let Err(cleanup) = self.storage.delete(generation).await {
                    warn!("Could not discard partial '{}': {}", generation, cleanup);
                }
                return Err(err);
            }
        }

        info!("Cache generation '{}' installed", generation);
        Ok(count)
    }

    /// Purge every cache store except the current generation.
    pub async fn activate(&self) -> Result<ActivationReport, CacheError> {
        let generation = self.generation();
        let stale: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter(|name| name != generation)
            .collect();

        let results = join_all(stale.iter().map(|name| async move {
            info!("Deleting old cache: {}", name);
            (name, self.storage.delete(name).await)
        }))
        .await;

        let mut deleted = Vec::with_capacity(results.len());
        for (name, result) in results {
            match result {
                Ok(true) => deleted.push(name.clone()),
                Ok(false) => debug!("Cache '{}' was already gone", name),
                Err(err) => warn!("Failed to delete cache '{}': {}", name, err),
            }
        }

        self.storage.open(generation).await?;
        Ok(ActivationReport {
            kept: generation.to_string(),
            deleted,
        })
    }

    /// Whether a request is handled by this cache at all.
    pub fn intercepts(&self, request: &Request) -> bool {
        request.is_get()
            && (is_same_origin(&request.url, &self.config.origin)
                || is_trusted_origin(&request.url, &self.config.trusted_origins))
    }

    /// Serve an intercepted request: cache first, then network.
    pub async fn respond(&self, request: &Request) -> Result<S::Response, CacheError> {
        let generation = self.generation();
        let key = self.key_for(&request.url);

        match self.storage.lookup(generation, &key).await {
            Ok(Some(hit)) => {
                debug!("Cache hit: {}", key);
                return Ok(hit);
            }
            Ok(None) => debug!("Cache miss: {}", key),
            Err(err) => warn!("Cache lookup for {} failed, using network: {}", key, err),
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if is_cacheable(&response) {
                    self.write_through(&key, &response).await;
                } else {
                    debug!(
                        "Not caching {} (status {}, {:?})",
                        key,
                        response.status(),
                        response.kind()
                    );
                }
                Ok(response)
            }
            Err(err) => {
                warn!("Network unavailable for {}: {}", key, err);
                self.offline_fallback(err).await
            }
        }
    }

    /// Full interception policy: pass through what we do not own,
    /// otherwise respond.
    pub async fn handle_fetch(
        &self,
        request: &Request,
    ) -> Result<FetchOutcome<S::Response>, CacheError> {
        if !self.intercepts(request) {
            debug!("Passing through {} {}", request.method, request.url);
            return Ok(FetchOutcome::Passthrough);
        }
        self.respond(request).await.map(FetchOutcome::Respond)
    }

    /// Background-sync hook. Only the contact form tag is recognised.
    pub fn handle_sync(&self, tag: &str) -> bool {
        if tag == config::CONTACT_SYNC_TAG {
            info!("Syncing contact form submissions...");
            true
        } else {
            debug!("Ignoring sync tag '{}'", tag);
            false
        }
    }

    // Failures here never reach the caller
    async fn write_through(&self, key: &str, response: &S::Response) {
        let copy = match response.try_clone() {
            Ok(copy) => copy,
            Err(err) => {
                warn!("Could not copy response for {}: {}", key, err);
                return;
            }
        };
        if let Err(err) = self.storage.put(self.generation(), key, copy).await {
            warn!("Failed to cache {}: {}", key, err);
        }
    }

    async fn offline_fallback(&self, cause: CacheError) -> Result<S::Response, CacheError> {
        let Some(document) = self.config.fallback_document.as_deref() else {
            return Err(cause);
        };
        let key = self.key_for(document);
        match self.storage.lookup(self.generation(), &key).await {
            Ok(Some(page)) => {
                info!("Serving offline fallback {}", key);
                Ok(page)
            }
            Ok(None) => Err(cause),
            Err(err) => {
                warn!("Fallback lookup for {} failed: {}", key, err);
                Err(cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryCacheStorage, MemoryNetwork, MemoryResponse};
    use futures::executor::block_on;

    const ORIGIN: &str = "https://me.dev";

    fn config(generation: &str, manifest: &[&str]) -> OfflineConfig {
        OfflineConfig {
            generation: generation.to_string(),
            origin: ORIGIN.to_string(),
            manifest: manifest.iter().map(|s| s.to_string()).collect(),
            trusted_origins: vec!["https://fonts.googleapis.com".to_string()],
            fallback_document: Some("/index.html".to_string()),
        }
    }

    fn manager(
        generation: &str,
        manifest: &[&str],
    ) -> (
        OfflineCache<MemoryCacheStorage, MemoryNetwork>,
        MemoryCacheStorage,
        MemoryNetwork,
    ) {
        let storage = MemoryCacheStorage::new();
        let network = MemoryNetwork::new();
        let cache = OfflineCache::new(
            config(generation, manifest),
            storage.clone(),
            network.clone(),
        )
        .unwrap();
        (cache, storage, network)
    }

    #[test]
    fn rejects_empty_generation() {
        let mut cfg = config("v1", &[]);
        cfg.generation = "  ".to_string();
        let err = OfflineCache::new(cfg, MemoryCacheStorage::new(), MemoryNetwork::new())
            .err()
            .unwrap();
        assert!(matches!(err, CacheError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_origin_with_path() {
        let mut cfg = config("v1", &[]);
        cfg.origin = "https://me.dev/app".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn config_from_json_fills_defaults() {
        let cfg = OfflineConfig::from_json(r#"{"generation":"v9","origin":"https://me.dev"}"#)
            .unwrap();
        assert_eq!(cfg.generation, "v9");
        assert_eq!(cfg.manifest.len(), config::PRECACHE_MANIFEST.len());
        assert_eq!(cfg.fallback_document.as_deref(), Some(config::FALLBACK_DOCUMENT));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn install_rejects_non_ok_manifest_entry() {
        let (cache, storage, network) = manager("v2", &["/index.html", "/missing.css"]);
        network.route("/index.html", MemoryResponse::ok("<html>"));
        network.route("/missing.css", MemoryResponse::with_status(404, ""));

        let err = block_on(cache.install()).unwrap_err();
        assert_eq!(
            err,
            CacheError::InstallRejected {
                url: "/missing.css".to_string(),
                status: 404
            }
        );
        assert!(storage.store_names().is_empty());
    }

    #[test]
    fn default_config_needs_an_origin() {
        let mut cfg = OfflineConfig::default();
        assert_eq!(
            cfg.validate(),
            Err(CacheError::InvalidConfig(
                "origin must be set before use".to_string()
            ))
        );
        cfg.origin = "https://me.dev".to_string();
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn install_rejects_opaque_manifest_entry() {
        let (cache, storage, network) = manager("v2", &["/index.html", "/font.woff2"]);
        network.route("/index.html", MemoryResponse::ok("<html>"));
        network.route("/font.woff2", MemoryResponse::opaque());

        let err = block_on(cache.install()).unwrap_err();
        assert!(matches!(err, CacheError::InstallRejected { ref url, .. } if url == "/font.woff2"));
        assert!(storage.store_names().is_empty());
    }

    #[test]
    fn install_open_failure_is_reported() {
        let (cache, storage, network) = manager("v2", &["/index.html"]);
        network.route("/index.html", MemoryResponse::ok("<html>"));
        storage.fail_opens(true);

        let err = block_on(cache.install()).unwrap_err();
        assert!(matches!(err, CacheError::Storage { ref cache, .. } if cache == "v2"));
        assert!(storage.store_names().is_empty());
    }

    #[test]
    fn error_kind_is_never_cacheable() {
        let errored = MemoryResponse::ok("").with_kind(ResponseKind::Error);
        assert_eq!(errored.status(), 200);
        assert!(!is_cacheable(&errored));
        assert!(is_cacheable(&MemoryResponse::ok("")));
        assert!(!is_cacheable(&MemoryResponse::opaque()));
    }

    #[test]
    fn activation_reports_deleted_generations() {
        let (cache, storage, _) = manager("v3", &[]);
        storage.seed("v1", "/index.html", MemoryResponse::ok("old"));
        storage.seed("v2", "/index.html", MemoryResponse::ok("older"));

        let report = block_on(cache.activate()).unwrap();
        let mut deleted = report.deleted.clone();
        deleted.sort();
        assert_eq!(report.kept, "v3");
        assert_eq!(deleted, vec!["v1".to_string(), "v2".to_string()]);
        assert_eq!(storage.store_names(), vec!["v3".to_string()]);
    }

    #[test]
    fn post_requests_are_not_intercepted() {
        let (cache, _, network) = manager("v1", &[]);
        let request = Request::new("POST", "https://me.dev/contact");
        let outcome = block_on(cache.handle_fetch(&request)).unwrap();
        assert!(matches!(outcome, FetchOutcome::Passthrough));
        assert_eq!(network.calls(), 0);
    }

    #[test]
    fn lookup_failure_falls_through_to_network() {
        let (cache, storage, network) = manager("v1", &[]);
        network.route("https://me.dev/a.css", MemoryResponse::ok("body"));
        storage.fail_reads(true);

        let response = block_on(cache.respond(&Request::get("https://me.dev/a.css"))).unwrap();
        assert_eq!(response.body(), b"body");
        assert_eq!(network.calls(), 1);
    }

    #[test]
    fn sync_only_handles_contact_form_tag() {
        let (cache, _, _) = manager("v1", &[]);
        assert!(cache.handle_sync("sync-contact-form"));
        assert!(!cache.handle_sync("something-else"));
    }
}
