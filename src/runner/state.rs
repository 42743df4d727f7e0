//! Run-scoped key/value state threaded between stages.

use std::collections::HashMap;

/// Well-known state keys.
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const ADMIN_TOKEN: &str = "admin_token";
    pub const SESSION_ID: &str = "session_id";
}

/// Values produced by earlier stages (tokens, session ids).
///
/// Owned by the runner for one run and never persisted. Keys are
/// write-once: the first stage to produce a key owns it.
#[derive(Debug, Default, Clone)]
pub struct RunState {
    values: HashMap<String, String>,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert a new key. Returns `false` and leaves the existing value
    /// untouched when the key is already set.
    pub(crate) fn insert_new(&mut self, key: &str, value: String) -> bool {
        if self.values.contains_key(key) {
            return false;
        }
        self.values.insert(key.to_string(), value);
        true
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
