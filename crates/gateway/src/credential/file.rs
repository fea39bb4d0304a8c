// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed credential store with atomic writes.
//!
//! This is the server-side stand-in for the browser cookie jar: one JSON
//! file holding named entries with independent expirations.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use crate::credential::{epoch_secs, CredentialStore, Entry};

/// Credential store persisted to a JSON file.
///
/// Expired entries are invisible to `get` and dropped from the file on the
/// next save. All I/O failures are logged and swallowed — a credential
/// store that cannot persist degrades to in-memory behavior rather than
/// failing calls.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, Entry>>,
}

impl FileStore {
    /// Open (or create) the store at `dir/credentials.json`.
    pub fn open(dir: &Path) -> Self {
        let path = dir.join("credentials.json");
        let entries = match load(&path) {
            Ok(map) => map,
            Err(e) => {
                if path.exists() {
                    tracing::warn!(path = %path.display(), err = %e, "failed to load credential file, starting empty");
                }
                HashMap::new()
            }
        };
        Self { path, entries: Mutex::new(entries) }
    }

    fn save_locked(&self, entries: &HashMap<String, Entry>) {
        let now = epoch_secs();
        let live: HashMap<&String, &Entry> =
            entries.iter().filter(|(_, e)| e.expires_at > now).collect();
        if let Err(e) = save(&self.path, &live) {
            tracing::warn!(path = %self.path.display(), err = %e, "failed to persist credentials");
        }
    }
}

impl CredentialStore for FileStore {
    fn get(&self, name: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        let entry = entries.get(name)?;
        if entry.expires_at > epoch_secs() {
            Some(entry.value.clone())
        } else {
            None
        }
    }

    fn set(&self, name: &str, value: &str, ttl: Duration) {
        let Ok(mut entries) = self.entries.lock() else { return };
        entries.insert(
            name.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: epoch_secs().saturating_add(ttl.as_secs()),
            },
        );
        self.save_locked(&entries);
    }

    fn remove(&self, name: &str) {
        let Ok(mut entries) = self.entries.lock() else { return };
        entries.remove(name);
        self.save_locked(&entries);
    }
}

/// Load entries from a JSON file.
fn load(path: &Path) -> anyhow::Result<HashMap<String, Entry>> {
    let contents = std::fs::read_to_string(path)?;
    let entries: HashMap<String, Entry> = serde_json::from_str(&contents)?;
    Ok(entries)
}

/// Save entries to a JSON file atomically (write tmp + rename).
///
/// Uses a unique temp filename (PID + counter) to avoid corruption when
/// concurrent saves race on the same `.tmp` file.
fn save(path: &Path, entries: &HashMap<&String, &Entry>) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent() {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(entries)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}
