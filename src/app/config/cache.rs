use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Cache key of the base application config.
pub const BASE_CONFIG_KEY: &str = "base";

/// Cache key of the app config with the plugin under development merged in.
pub const MERGED_CONFIG_KEY: &str = "app.config.json";

/// Parsed configuration documents keyed by logical name.
///
/// Built once per server start and shared by reference with every handler.
#[derive(Debug, Clone, Default)]
pub struct ConfigCache {
    entries: Arc<DashMap<String, Value>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}
