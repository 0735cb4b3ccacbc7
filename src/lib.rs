use std::fmt;
use wasm_bindgen::prelude::*;

pub mod animator;
pub mod browser;
pub mod cache;
pub mod config;
pub mod logging;
pub mod offline;
pub mod page;
pub mod particles;
pub mod prefs;
pub mod service_worker;
pub mod utils;

pub use offline::{
    ActivationReport, CacheStorage, FetchOutcome, HostResponse, Network, OfflineCache,
    OfflineConfig, Request, ResponseKind,
};
pub use particles::{Particle, ParticleConfig, ParticleField};
pub use prefs::Theme;

// Errors raised by the offline cache manager and its host adapters
#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    InvalidConfig(String),
    /// The network could not be reached at all (offline, DNS, CORS failure)
    Network {
        url: String,
        reason: String,
    },
    /// A manifest entry answered, but not with something worth caching
    InstallRejected {
        url: String,
        status: u16,
    },
    Storage {
        cache: String,
        reason: String,
    },
    /// Anything the host runtime threw that does not fit the variants above
    Host(String),
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidConfig(reason) => {
                write!(f, "Invalid offline cache configuration: {}", reason)
            }
            CacheError::Network { url, reason } => {
                write!(f, "Network request for {} failed: {}", url, reason)
            }
            CacheError::InstallRejected { url, status } => write!(
                f,
                "Refusing to precache {}: response status {} is not cacheable",
                url, status
            ),
            CacheError::Storage { cache, reason } => {
                write!(f, "Cache store '{}' failed: {}", cache, reason)
            }
            CacheError::Host(reason) => write!(f, "Host runtime error: {}", reason),
        }
    }
}

impl std::error::Error for CacheError {}

impl From<CacheError> for JsValue {
    fn from(err: CacheError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
