//! Theme preference and visit counter, persisted in local storage.

use crate::config::{THEME_STORAGE_KEY, VISITS_STORAGE_KEY};
use log::warn;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub enum PrefsError {
    Unavailable,
    Read(String),
    Write(String),
}

impl fmt::Display for PrefsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefsError::Unavailable => write!(f, "Local storage is not available"),
            PrefsError::Read(reason) => write!(f, "Failed to read preference: {}", reason),
            PrefsError::Write(reason) => write!(f, "Failed to write preference: {}", reason),
        }
    }
}

impl std::error::Error for PrefsError {}

/// String key-value storage, local storage in the browser.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.values
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// `window.localStorage`.
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    pub fn open() -> Result<Self, PrefsError> {
        let storage = gloo_utils::window()
            .local_storage()
            .map_err(|e| PrefsError::Read(crate::browser::describe_js(&e)))?
            .ok_or(PrefsError::Unavailable)?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, PrefsError> {
        self.storage
            .get_item(key)
            .map_err(|e| PrefsError::Read(crate::browser::describe_js(&e)))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PrefsError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| PrefsError::Write(crate::browser::describe_js(&e)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Material symbol for the button that switches away from this theme.
    pub fn toggle_icon(self) -> &'static str {
        match self {
            Theme::Light => "dark_mode",
            Theme::Dark => "light_mode",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(format!("Unknown theme '{}'", other)),
        }
    }
}

/// Stored theme, falling back to light on anything unexpected.
pub fn load_theme(store: &impl KeyValueStore) -> Theme {
    match store.get(THEME_STORAGE_KEY) {
        Ok(Some(raw)) => raw.parse().unwrap_or_else(|err| {
            warn!("{}, using default theme", err);
            Theme::default()
        }),
        Ok(None) => Theme::default(),
        Err(err) => {
            warn!("{}", err);
            Theme::default()
        }
    }
}

pub fn save_theme(store: &impl KeyValueStore, theme: Theme) {
    if let Err(err) = store.set(THEME_STORAGE_KEY, theme.as_str()) {
        warn!("Theme not persisted: {}", err);
    }
}

/// Count this page load and return the new total.
pub fn record_visit(store: &impl KeyValueStore) -> u64 {
    let previous = match store.get(VISITS_STORAGE_KEY) {
        Ok(raw) => raw.and_then(|v| v.trim().parse::<u64>().ok()).unwrap_or(0),
        Err(err) => {
            warn!("{}", err);
            0
        }
    };
    let total = previous.saturating_add(1);
    if let Err(err) = store.set(VISITS_STORAGE_KEY, &total.to_string()) {
        warn!("Visit count not persisted: {}", err);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, PrefsError> {
            Err(PrefsError::Unavailable)
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), PrefsError> {
            Err(PrefsError::Write("SecurityError".to_string()))
        }
    }

    #[test]
    fn theme_defaults_to_light() {
        assert_eq!(load_theme(&MemoryStore::new()), Theme::Light);
        assert_eq!(load_theme(&BrokenStore), Theme::Light);
    }

    #[test]
    fn theme_round_trips_through_storage() {
        let store = MemoryStore::new();
        save_theme(&store, Theme::Light.toggled());
        assert_eq!(store.get(THEME_STORAGE_KEY).unwrap().as_deref(), Some("dark"));
        assert_eq!(load_theme(&store), Theme::Dark);
    }

    #[test]
    fn unknown_stored_theme_is_ignored() {
        let store = MemoryStore::new();
        store.set(THEME_STORAGE_KEY, "sepia").unwrap();
        assert_eq!(load_theme(&store), Theme::Light);
    }

    #[test]
    fn theme_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!(Theme::Dark.toggle_icon(), "light_mode");
    }

    #[test]
    fn visits_increment_from_missing_or_garbage() {
        let store = MemoryStore::new();
        assert_eq!(record_visit(&store), 1);
        assert_eq!(record_visit(&store), 2);

        store.set(VISITS_STORAGE_KEY, "not a number").unwrap();
        assert_eq!(record_visit(&store), 1);
    }

    #[test]
    fn visits_survive_broken_storage() {
        assert_eq!(record_visit(&BrokenStore), 1);
    }
}
