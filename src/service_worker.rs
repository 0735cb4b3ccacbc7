//! Service worker entry points for an [`OfflineCache`] backed by the real
//! Cache API.
//!
//! Hosts only dispatch events to listeners that exist when the worker
//! script is first evaluated, while the wasm module is instantiated
//! asynchronously. The listeners are therefore bound by the loader script
//! (`static/sw.js`), which forwards each event into the exported handlers
//! once the module is ready.
//!
//! The binary's `main` runs during instantiation and calls [`start`], so
//! every handler sees a configured cache.

use crate::browser::{describe_js, BrowserCacheStorage, BrowserNetwork};
use crate::offline::{FetchOutcome, OfflineCache, OfflineConfig, Request};
use crate::CacheError;
use js_sys::Promise;
use log::{debug, error, info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, JsFuture};
use web_sys::{ServiceWorkerGlobalScope, WorkerGlobalScope};

type WorkerCache = OfflineCache<BrowserCacheStorage, BrowserNetwork>;

thread_local! {
    static WORKER: RefCell<Option<Rc<WorkerCache>>> = const { RefCell::new(None) };
}

fn worker_scope() -> Result<ServiceWorkerGlobalScope, CacheError> {
    js_sys::global()
        .dyn_into()
        .map_err(|_| CacheError::Host("not running inside a service worker".to_string()))
}

fn worker() -> Result<Rc<WorkerCache>, CacheError> {
    WORKER
        .with(|slot| slot.borrow().clone())
        .ok_or_else(|| CacheError::Host("service worker not started".to_string()))
}

/// Build the cache manager for this worker. Calling it again replaces the
/// configuration.
///
/// An empty `config.origin` is replaced with the worker's own origin.
pub fn start(mut config: OfflineConfig) -> Result<(), CacheError> {
    let scope = worker_scope()?;
    if config.origin.is_empty() {
        config.origin = scope.location().origin();
    }
    let caches = scope.caches().map_err(|e| CacheError::Host(describe_js(&e)))?;
    let network = BrowserNetwork::new(WorkerGlobalScope::clone(&scope));
    let cache = OfflineCache::new(config, BrowserCacheStorage::new(caches), network)?;

    info!(
        "Service worker ready, generation '{}'",
        cache.config().generation
    );
    WORKER.with(|slot| *slot.borrow_mut() = Some(Rc::new(cache)));
    Ok(())
}

/// JS entry point. `config` may be `undefined` for the built-in defaults,
/// or an object with any of the `OfflineConfig` fields.
#[wasm_bindgen(js_name = startServiceWorker)]
pub fn start_service_worker(config: JsValue) -> Result<(), JsValue> {
    let config = if config.is_undefined() || config.is_null() {
        OfflineConfig::default()
    } else {
        serde_wasm_bindgen::from_value(config)
            .map_err(|e| CacheError::InvalidConfig(e.to_string()))?
    };
    start(config).map_err(JsValue::from)
}

/// `install` event: resolves with the number of precached entries. The
/// new worker skips the waiting phase whether or not precaching succeeds.
#[wasm_bindgen(js_name = handleInstall)]
pub fn handle_install() -> Promise {
    match worker_scope().map(|scope| scope.skip_waiting()) {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => warn!("skipWaiting failed: {}", describe_js(&err)),
        Err(err) => warn!("skipWaiting failed: {}", err),
    }
    future_to_promise(async move {
        let stored = worker()?.install().await?;
        Ok(JsValue::from(stored as u32))
    })
}

/// `activate` event: purges stale generations, then claims open clients.
#[wasm_bindgen(js_name = handleActivate)]
pub fn handle_activate() -> Promise {
    future_to_promise(async move {
        let report = worker()?.activate().await.map_err(|err| {
            error!("Activation failed: {}", err);
            err
        })?;
        info!(
            "Activated '{}', removed {} stale cache(s)",
            report.kept,
            report.deleted.len()
        );
        JsFuture::from(worker_scope()?.clients().claim()).await?;
        Ok(JsValue::UNDEFINED)
    })
}

/// `fetch` event: resolves with the response to hand to `respondWith`.
/// Requests the cache does not own go to the network untouched.
#[wasm_bindgen(js_name = handleFetch)]
pub fn handle_fetch(request: web_sys::Request) -> Promise {
    future_to_promise(async move {
        let cache = worker()?;
        let outgoing = Request::new(request.method(), request.url());
        match cache.handle_fetch(&outgoing).await? {
            FetchOutcome::Respond(response) => Ok(response.into_inner().into()),
            FetchOutcome::Passthrough => Ok(cache.network().forward(&request).await?),
        }
    })
}

/// `sync` event: whether the tag was recognised.
#[wasm_bindgen(js_name = handleSync)]
pub fn handle_sync(tag: String) -> Result<bool, JsValue> {
    let handled = worker()?.handle_sync(&tag);
    if !handled {
        debug!("No sync work for '{}'", tag);
    }
    Ok(handled)
}
