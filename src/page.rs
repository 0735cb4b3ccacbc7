//! Small page-side browser hooks.

use crate::browser::describe_js;
use crate::config::REDUCED_MOTION_QUERY;
use crate::prefs::Theme;
use gloo_events::EventListener;
use log::{info, warn};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{ServiceWorkerRegistration, ServiceWorkerState};

/// Whether the user asked the system for less motion. Read once; changes
/// while the page is open are not tracked.
pub fn prefers_reduced_motion() -> bool {
    match gloo_utils::window().match_media(REDUCED_MOTION_QUERY) {
        Ok(Some(query)) => query.matches(),
        Ok(None) => false,
        Err(err) => {
            warn!("matchMedia failed: {}", describe_js(&err));
            false
        }
    }
}

/// Expose the theme to the stylesheet as `data-theme` on `<html>`.
pub fn apply_theme(theme: Theme) {
    let Some(root) = gloo_utils::document().document_element() else {
        return;
    };
    if let Err(err) = root.set_attribute("data-theme", theme.as_str()) {
        warn!("Could not apply theme: {}", describe_js(&err));
    }
}

/// Register the offline service worker once the window has finished
/// loading, so registration never competes with first paint.
pub fn register_service_worker_on_load(script_url: &'static str) {
    let document = gloo_utils::document();
    let state = js_sys::Reflect::get(&document, &JsValue::from_str("readyState"))
        .ok()
        .and_then(|state| state.as_string());
    if state.as_deref() == Some("complete") {
        spawn_local(register_service_worker(script_url));
        return;
    }
    EventListener::once(&gloo_utils::window(), "load", move |_| {
        spawn_local(register_service_worker(script_url))
    })
    .forget();
}

/// Register the offline service worker. Never fatal for the page.
pub async fn register_service_worker(script_url: &str) {
    let container = gloo_utils::window().navigator().service_worker();
    match JsFuture::from(container.register(script_url)).await {
        Ok(value) => match value.dyn_into::<ServiceWorkerRegistration>() {
            Ok(registration) => {
                info!("ServiceWorker registered: {}", registration.scope());
                watch_for_updates(&registration);
            }
            Err(_) => info!("ServiceWorker registered"),
        },
        Err(err) => warn!("ServiceWorker registration failed: {}", describe_js(&err)),
    }
}

/// An installed worker is an update only while an older one controls the
/// page.
pub fn is_pending_update(state: ServiceWorkerState, controlled: bool) -> bool {
    state == ServiceWorkerState::Installed && controlled
}

fn watch_for_updates(registration: &ServiceWorkerRegistration) {
    let watched = registration.clone();
    EventListener::new(registration, "updatefound", move |_| {
        let Some(worker) = watched.installing() else {
            return;
        };
        let incoming = worker.clone();
        EventListener::new(&worker, "statechange", move |_| {
            let controlled = gloo_utils::window()
                .navigator()
                .service_worker()
                .controller()
                .is_some();
            if is_pending_update(incoming.state(), controlled) {
                info!("New version available! Refresh to update.");
            }
        })
        .forget();
    })
    .forget();
}
