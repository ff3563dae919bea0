/*!
 * Translation caching functionality.
 *
 * Translations are stored under the SHA-256 fingerprint of their source text,
 * so identical text costs at most one backend call across files and runs. The
 * cache is loaded once per run and written back atomically at checkpoints.
 */

use anyhow::{Context, Result};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Deterministic cache key for a source text
pub fn fingerprint(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Snapshot of cache usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Shared fingerprint → translation store
#[derive(Debug, Clone, Default)]
pub struct TranslationCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
    hits: Arc<AtomicUsize>,
    misses: Arc<AtomicUsize>,
    dirty: Arc<AtomicBool>,
    save_lock: Arc<Mutex<()>>,
}

impl TranslationCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a cache file.
    ///
    /// A missing file gives an empty cache. An unreadable or corrupt file gives
    /// an empty cache and a warning; it never aborts the run.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            debug!("No translation cache at {}, starting empty", path.display());
            return Self::new();
        }

        let parsed = fs::read_to_string(path)
            .map_err(anyhow::Error::from)
            .and_then(|text| serde_json::from_str::<HashMap<String, String>>(&text).map_err(anyhow::Error::from));

        match parsed {
            Ok(entries) => {
                debug!("Loaded {} cached translations from {}", entries.len(), path.display());
                Self {
                    entries: Arc::new(RwLock::new(entries)),
                    ..Self::default()
                }
            }
            Err(e) => {
                warn!(
                    "Ignoring unreadable translation cache {}: {}",
                    path.display(),
                    e
                );
                Self::new()
            }
        }
    }

    /// Write the cache to `path` if it changed since the last save.
    ///
    /// The file is written to a temporary sibling and renamed over the target,
    /// so a crash never leaves a truncated cache behind.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<bool> {
        let _guard = self.save_lock.lock();

        // Entries added after this point mark the cache dirty again
        if !self.dirty.swap(false, Ordering::SeqCst) {
            return Ok(false);
        }

        let path = path.as_ref();
        let result = self.write_snapshot(path);
        if result.is_err() {
            self.dirty.store(true, Ordering::SeqCst);
        }
        result.map(|_| true)
    }

    fn write_snapshot(&self, path: &Path) -> Result<()> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;

        // Sorted for stable diffs
        let snapshot: std::collections::BTreeMap<String, String> = self
            .entries
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot).context("Failed to serialize translation cache")?;

        let mut temp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary cache file in {}", dir.display()))?;
        temp.write_all(json.as_bytes())
            .context("Failed to write temporary cache file")?;
        temp.persist(path)
            .with_context(|| format!("Failed to replace cache file: {}", path.display()))?;

        debug!("Saved {} cached translations to {}", snapshot.len(), path.display());
        Ok(())
    }

    /// Look up the translation of `text`
    pub fn get(&self, text: &str) -> Option<String> {
        let key = fingerprint(text);
        match self.entries.read().get(&key) {
            Some(translation) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(translation.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store the translation of `text` unless one is already present.
    ///
    /// Returns the value now held by the cache, which is the earlier entry if
    /// there was one.
    pub fn upsert(&self, text: &str, translation: &str) -> String {
        let key = fingerprint(text);
        let mut entries = self.entries.write();
        let stored = entries.entry(key).or_insert_with(|| {
            self.dirty.store(true, Ordering::SeqCst);
            translation.to_string()
        });
        stored.clone()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.read().contains_key(&fingerprint(text))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Whether there are entries not yet saved
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
