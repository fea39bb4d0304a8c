// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential persistence: a TTL key/value store for auth state.
//!
//! The store is deliberately dumb — no validation of token contents, no
//! knowledge of what a key means. Expiry is enforced on read. Mutation is
//! owned by the refresh coordinator (success path) and the session handler
//! (clear path); everything else only reads.

pub mod file;

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Short-lived bearer credential attached to dispatched requests.
pub const ACCESS_TOKEN: &str = "access_token";
/// Longer-lived credential used solely to obtain a new access token.
pub const REFRESH_TOKEN: &str = "refresh_token";
/// Identifier of the signed-in user.
pub const USER_ID: &str = "user_id";
/// Cookie-consent identifier.
pub const CONSENT_ID: &str = "consent_id";
/// Anonymous session identifier.
pub const SESSION_ID: &str = "session_id";
/// UI theme preference.
pub const THEME: &str = "theme";

/// Default lifetime for a key when the caller does not supply one.
pub fn default_ttl(name: &str) -> Duration {
    const DAY: u64 = 86_400;
    let days = match name {
        ACCESS_TOKEN => 7,
        REFRESH_TOKEN => 7,
        USER_ID => 7,
        CONSENT_ID => 365,
        SESSION_ID => 1,
        THEME => 365,
        _ => 7,
    };
    Duration::from_secs(days * DAY)
}

/// Abstract credential storage.
///
/// `set` overwrites silently; `remove` is idempotent. Implementations must
/// treat an expired entry as absent.
pub trait CredentialStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str, ttl: Duration);
    fn remove(&self, name: &str);
}

/// One stored value with its expiry as epoch seconds.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Entry {
    pub value: String,
    pub expires_at: u64,
}

impl Entry {
    fn live(&self, now: u64) -> bool {
        self.expires_at > now
    }
}

/// In-memory store, used by tests and as a fallback when no state
/// directory is writable.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(name)?;
        if entry.live(epoch_secs()) {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                name.to_owned(),
                Entry {
                    value: value.to_owned(),
                    expires_at: epoch_secs().saturating_add(ttl.as_secs()),
                },
            );
        }
    }

    fn remove(&self, name: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(name);
        }
    }
}

/// Return the current anonymous session id, minting one if absent or
/// expired.
pub fn ensure_session_id(store: &dyn CredentialStore) -> String {
    if let Some(id) = store.get(SESSION_ID) {
        return id;
    }
    let id = uuid::Uuid::new_v4().to_string();
    store.set(SESSION_ID, &id, default_ttl(SESSION_ID));
    id
}

/// Return current epoch seconds.
pub fn epoch_secs() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
