//! Content-addressed request cache for upstream responses.
//!
//! Maps a normalized request fingerprint to a previously obtained response
//! and guarantees at most one upstream call per unique
//! (model, system prompt, profile, query) tuple, across process restarts
//! when the durable store is reused.
//!
//! Durability uses the write-to-`.tmp`-then-rename pattern so the store is
//! valid JSON after every completed write; an interrupted run leaves the
//! previous file intact. A corrupted or unreadable store degrades the
//! cache to in-memory operation for the session instead of aborting the
//! run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};

use crate::catalog::UserProfile;
use crate::error::UpstreamError;

/// Deterministic fingerprint of a request's semantic content.
///
/// Computed over a canonical serialization with a fixed field order, so
/// two logically identical requests always produce the same key no matter
/// how their inputs were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey(String);

impl RequestKey {
    /// Compute the fingerprint for a (model, system prompt, profile, query)
    /// tuple.
    pub fn compute(model: &str, system_prompt: &str, profile: &UserProfile, query: &str) -> Self {
        let canonical = format!(
            "model={model}\u{1f}system={system_prompt}\u{1f}profile={}\u{1f}query={query}",
            profile.canonical()
        );
        let digest = Sha256::digest(canonical.as_bytes());
        let mut hex = String::with_capacity(64);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        RequestKey(hex)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a cached response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    /// Obtained from the live generative-language service.
    Live,
    /// Produced by the deterministic synthetic generator.
    Synthetic,
}

impl std::fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseSource::Live => f.write_str("live"),
            ResponseSource::Synthetic => f.write_str("synthetic"),
        }
    }
}

/// A stored upstream response. Appended on miss, read on hit, never
/// mutated in place; an overwrite replaces the record wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub request_key: RequestKey,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub source: ResponseSource,
    pub model: String,
}

/// Explicitly owned response cache with a durable JSON backing store.
///
/// Open at run start, flushed on every insert; no ambient singleton.
pub struct ResponseCache {
    store_path: Option<PathBuf>,
    entries: BTreeMap<String, CachedResponse>,
    degraded: bool,
    hits: u64,
    misses: u64,
}

impl ResponseCache {
    /// Open the cache backed by the durable store at `path`.
    ///
    /// A missing file starts an empty cache. An unreadable or corrupted
    /// file is logged and the cache degrades to in-memory-only operation
    /// for the session; it never aborts the analysis run.
    pub fn open(path: &Path) -> Self {
        match Self::load_store(path) {
            Ok(entries) => {
                tracing::debug!(path = %path.display(), entries = entries.len(), "Opened response cache");
                Self {
                    store_path: Some(path.to_path_buf()),
                    entries,
                    degraded: false,
                    hits: 0,
                    misses: 0,
                }
            }
            Err(message) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %message,
                    "Cache store unreadable, degrading to in-memory cache for this session"
                );
                // Keep the path so `clear` can still remove the corrupt
                // file; `persist` is gated on the degraded flag.
                Self {
                    store_path: Some(path.to_path_buf()),
                    entries: BTreeMap::new(),
                    degraded: true,
                    hits: 0,
                    misses: 0,
                }
            }
        }
    }

    /// Create a cache with no durable backing store.
    pub fn in_memory() -> Self {
        Self {
            store_path: None,
            entries: BTreeMap::new(),
            degraded: false,
            hits: 0,
            misses: 0,
        }
    }

    fn load_store(path: &Path) -> std::result::Result<BTreeMap<String, CachedResponse>, String> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let data = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        serde_json::from_str(&data).map_err(|e| e.to_string())
    }

    /// Look up a stored response without computing.
    pub fn get(&self, key: &RequestKey) -> Option<&CachedResponse> {
        self.entries.get(key.as_str())
    }

    /// Return the stored response for `key`, or invoke `compute` exactly
    /// once, store its result durably, and return it.
    ///
    /// `compute` yields the raw response text and its source; the cache
    /// stamps the timestamp and persists before returning. Compute
    /// failures pass through untouched and leave no cache entry.
    pub async fn get_or_compute<F, Fut>(
        &mut self,
        key: RequestKey,
        model: &str,
        compute: F,
    ) -> std::result::Result<CachedResponse, UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = std::result::Result<(String, ResponseSource), UpstreamError>>,
    {
        if let Some(cached) = self.entries.get(key.as_str()) {
            self.hits += 1;
            tracing::debug!(key = %key, "Cache hit");
            return Ok(cached.clone());
        }

        self.misses += 1;
        let (text, source) = compute().await?;
        let response = CachedResponse {
            request_key: key.clone(),
            text,
            timestamp: Utc::now(),
            source,
            model: model.to_string(),
        };
        self.entries
            .insert(key.as_str().to_string(), response.clone());
        self.persist();
        Ok(response)
    }

    /// Insert a response directly, replacing any previous record for the
    /// same key (last write wins), and persist.
    pub fn insert(&mut self, response: CachedResponse) {
        self.entries
            .insert(response.request_key.as_str().to_string(), response);
        self.persist();
    }

    /// Write the full store atomically. A write failure degrades to
    /// in-memory operation with a warning rather than failing the run. A
    /// degraded cache never writes: the unreadable store on disk is left
    /// for the operator (or `clear`) to deal with.
    fn persist(&mut self) {
        if self.degraded {
            return;
        }
        let Some(path) = self.store_path.clone() else {
            return;
        };
        if let Err(e) = Self::atomic_write_store(&path, &self.entries) {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to persist cache store, continuing in-memory only"
            );
            self.degraded = true;
        }
    }

    fn atomic_write_store(
        path: &Path,
        entries: &BTreeMap<String, CachedResponse>,
    ) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(std::io::Error::other)?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json.as_bytes())?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Number of stored responses.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Remove every entry and delete the durable store file.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Some(path) = &self.store_path {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove cache store");
                }
            }
        }
        self.hits = 0;
        self.misses = 0;
    }

    /// Size of the durable store file in bytes (0 when absent).
    pub fn size_on_disk(&self) -> u64 {
        self.store_path
            .as_deref()
            .and_then(|p| std::fs::metadata(p).ok())
            .map(|m| m.len())
            .unwrap_or(0)
    }

    /// Whether the cache fell back to in-memory-only operation.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// (hits, misses) observed this session.
    pub fn hit_stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
