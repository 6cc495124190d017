//! File-backed geocode cache.
//!
//! The whole file is read once when the cache is opened and rewritten in full
//! after every insert. Entries never expire and are never refreshed.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::types::ResolvedLocation;

const KEY_PREFIX: &str = "geo:";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheRecord {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug)]
pub struct GeocodeCache {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, CacheRecord>>,
}

/// Cache key for a search name: `geo:` followed by the lower-cased name.
pub fn cache_key(name: &str) -> String {
    format!("{}{}", KEY_PREFIX, name.to_lowercase())
}

impl GeocodeCache {
    /// Open the cache at `path`, loading whatever it already holds.
    ///
    /// A missing or unreadable file yields an empty cache.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    tracing::warn!("Failed to create cache directory {}: {}", parent.display(), e);
                }
            }
        }

        let entries = Self::load(&path);
        tracing::debug!("Loaded {} geocode cache entries from {}", entries.len(), path.display());

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> BTreeMap<String, CacheRecord> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(),
        };

        match serde_json::from_str(&contents) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Ignoring unreadable geocode cache {}: {}", path.display(), e);
                BTreeMap::new()
            }
        }
    }

    /// Look up a search name. `name` doubles as the display name for
    /// entries that were stored without one.
    pub fn get(&self, name: &str) -> Option<ResolvedLocation> {
        let entries = self.entries.lock();
        let record = entries.get(&cache_key(name))?;

        Some(ResolvedLocation {
            latitude: record.latitude,
            longitude: record.longitude,
            display_name: record
                .display_name
                .clone()
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| name.to_string()),
        })
    }

    /// Remember a resolution and rewrite the cache file.
    ///
    /// Write failures are logged and otherwise ignored.
    pub fn put(&self, name: &str, location: &ResolvedLocation) {
        let snapshot = {
            let mut entries = self.entries.lock();
            entries.insert(
                cache_key(name),
                CacheRecord {
                    latitude: location.latitude,
                    longitude: location.longitude,
                    display_name: Some(location.display_name.clone()),
                },
            );
            serde_json::to_string_pretty(&*entries)
        };

        let result = snapshot
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));

        if let Err(e) = result {
            tracing::warn!("Failed to save geocode cache to {}: {}", self.path.display(), e);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
