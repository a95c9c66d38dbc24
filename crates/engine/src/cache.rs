//! Persisted result cache keyed by content fingerprint.
//!
//! Entries live in a flat directory, one JSON file per
//! (content hash, detector, mtime) fingerprint. Any content or mtime
//! change produces a different key, so stale entries are simply never
//! found again; the sweep bounds how long they stay on disk.

use blake3::Hasher;
use detectors::Finding;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// Cache tuning knobs, immutable for the lifetime of one cache handle.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub dir: PathBuf,
    /// Entries older than this are treated as absent.
    pub ttl: Duration,
    /// Entries older than this are physically removed by the sweep.
    pub sweep_after: Duration,
    /// Detector executions faster than this are not worth a write.
    pub min_exec_time: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".dbsentry_cache"),
            ttl: Duration::from_secs(24 * 60 * 60),
            sweep_after: Duration::from_secs(7 * 24 * 60 * 60),
            min_exec_time: Duration::from_millis(100),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    created: u64,
    findings: Vec<Finding>,
}

/// Computes the cache key for a (file, detector) pair from the current
/// file bytes and modification time. `None` when the file cannot be
/// read, which callers treat as uncacheable.
pub fn fingerprint(path: &Path, detector: &str) -> Option<String> {
    let bytes = fs::read(path).ok()?;
    let mtime = fs::metadata(path)
        .ok()?
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_secs();
    let mut hasher = Hasher::new();
    hasher.update(detector.as_bytes());
    hasher.update(b"\0");
    hasher.update(&bytes);
    hasher.update(b"\0");
    hasher.update(&mtime.to_le_bytes());
    Some(hasher.finalize().to_hex().to_string())
}

/// Shared, thread-safe handle to the on-disk cache. Created once per
/// scan invocation and shared by reference across workers.
pub struct ResultCache {
    config: CacheConfig,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl ResultCache {
    /// Opens (and if needed creates) the cache directory, then sweeps
    /// entries past the long-term threshold. All I/O is best-effort.
    pub fn open(config: CacheConfig) -> Self {
        if let Err(e) = fs::create_dir_all(&config.dir) {
            warn!(dir = %config.dir.display(), error = %e, "failed to create cache directory");
        }
        let cache = Self {
            config,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        };
        cache.sweep();
        cache
    }

    /// Looks up a fingerprint. Expired, corrupt or partially written
    /// entries are treated as absent; expired files are removed.
    pub fn get(&self, key: &str) -> Option<Vec<Finding>> {
        let path = self.entry_path(key);
        let entry = fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str::<CacheEntry>(&data).ok());
        let Some(entry) = entry else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        };
        if age_of(entry.created) >= self.config.ttl {
            debug!(key, "cache entry expired");
            let _ = fs::remove_file(&path);
            self.misses.fetch_add(1, Ordering::Relaxed);
            return None;
        }
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(entry.findings)
    }

    /// Stores findings for a fingerprint. Skipped when the execution was
    /// cheaper than a serialize-and-write; failures only cost the
    /// speed-up on the next run.
    pub fn put(&self, key: &str, findings: &[Finding], elapsed: Duration) {
        if elapsed < self.config.min_exec_time {
            debug!(key, ?elapsed, "execution too fast to cache");
            return;
        }
        let entry = CacheEntry {
            created: unix_now(),
            findings: findings.to_vec(),
        };
        let data = match serde_json::to_string(&entry) {
            Ok(d) => d,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize cache entry");
                return;
            }
        };
        // Write-then-rename keeps concurrent readers off half-written
        // entries: they see the old file or the new one, never a mix.
        let path = self.entry_path(key);
        let tmp = path.with_extension("json.tmp");
        if let Err(e) = fs::write(&tmp, &data).and_then(|_| fs::rename(&tmp, &path)) {
            warn!(key, error = %e, "failed to persist cache entry");
            let _ = fs::remove_file(&tmp);
        }
    }

    /// Removes entries older than the long-term threshold, bounding
    /// storage growth. Unreadable entries are removed too.
    pub fn sweep(&self) {
        let Ok(entries) = fs::read_dir(&self.config.dir) else {
            return;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let created = fs::read_to_string(&path)
                .ok()
                .and_then(|data| serde_json::from_str::<CacheEntry>(&data).ok())
                .map(|e| e.created);
            let stale = match created {
                Some(created) => age_of(created) >= self.config.sweep_after,
                None => true,
            };
            if stale {
                debug!(path = %path.display(), "sweeping stale cache entry");
                let _ = fs::remove_file(&path);
            }
        }
    }

    /// Deletes every entry. Returns the number of removed files.
    pub fn clear(&self) -> anyhow::Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.config.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Number of entries currently on disk.
    pub fn entry_count(&self) -> usize {
        fs::read_dir(&self.config.dir)
            .map(|entries| {
                entries
                    .flatten()
                    .filter(|e| {
                        e.path().extension().and_then(|x| x.to_str()) == Some("json")
                    })
                    .count()
            })
            .unwrap_or(0)
    }

    /// (hits, misses) recorded by this handle.
    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.config.dir
    }

    pub fn min_exec_time(&self) -> Duration {
        self.config.min_exec_time
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.config.dir.join(format!("{key}.json"))
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn age_of(created: u64) -> Duration {
    Duration::from_secs(unix_now().saturating_sub(created))
}
