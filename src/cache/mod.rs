//! Cache module
//!
//! Keeps the last status snapshot of each host on disk so repeated callers
//! do not query the game server on every request.
//!
//! ## Layout
//!
//! One JSON file per host inside the cache directory:
//! - `<cache_dir>/<host>.json` - the serialized [`StatusRecord`]
//!
//! Bytes of the host outside `[A-Za-z0-9.-]`, and a leading `.`, are
//! percent-encoded (`::1` becomes `%3A%3A1`), so distinct hosts never share
//! a file and no stem can escape the directory.
//!
//! ## Freshness
//!
//! A snapshot is fresh while `now - mtime < ttl`. Nothing runs in the
//! background; freshness is computed when asked. Writes go to a temporary
//! sibling file and are renamed into place, so readers never observe a
//! partially written snapshot. Concurrent writers for the same host race and
//! the last rename wins.

pub mod clock;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, trace, warn};

use crate::config::StatusConfig;
use crate::error::{CacheError, Result, StatusError};
use crate::net::Target;
use crate::status::record::StatusRecord;

pub use clock::{Clock, ManualClock, SystemClock};

/// Extension of snapshot files
const CACHE_EXTENSION: &str = "json";

/// Distinguishes temporary files of concurrent writers within one process
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Metadata of a stored snapshot
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Path of the snapshot file
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Age relative to the store's clock (zero if the mtime is in the future)
    pub age: Duration,
    /// Size of the serialized payload
    pub len: u64,
}

/// File-backed snapshot store
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Directory holding the snapshot files
    dir: PathBuf,
    /// Maximum age of a fresh snapshot
    ttl: Duration,
    /// Time source for age computation
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    /// Create a store using the system clock
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self::with_clock(dir, ttl, Arc::new(SystemClock))
    }

    /// Create a store with an explicit time source
    pub fn with_clock(dir: impl Into<PathBuf>, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            ttl,
            clock,
        }
    }

    /// Create a store from configuration
    pub fn from_config(config: &StatusConfig) -> Self {
        Self::new(config.cache_dir.clone(), config.cache_ttl())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Path of the snapshot file for a target
    pub fn path_for(&self, target: &Target) -> PathBuf {
        self.dir
            .join(format!("{}.{}", sanitize_host(target.host()), CACHE_EXTENSION))
    }

    /// Stat the snapshot file of a target
    ///
    /// Returns `None` if the file does not exist or cannot be stat'ed.
    pub async fn entry(&self, target: &Target) -> Option<CacheEntry> {
        let path = self.path_for(target);
        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                warn!(path = %path.display(), "Cache path is not a regular file");
                return None;
            }
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %path.display(), error = %e, "Failed to stat cache file");
                }
                return None;
            }
        };

        let modified: DateTime<Utc> = match metadata.modified() {
            Ok(time) => time.into(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cache file has no modification time");
                return None;
            }
        };

        let age = (self.clock.now() - modified)
            .to_std()
            .unwrap_or(Duration::ZERO);

        Some(CacheEntry {
            path,
            modified,
            age,
            len: metadata.len(),
        })
    }

    /// Whether the snapshot of a target exists and is younger than the TTL
    pub async fn is_fresh(&self, target: &Target) -> bool {
        match self.entry(target).await {
            Some(entry) => {
                let fresh = entry.age < self.ttl;
                trace!(
                    server = %target,
                    age_secs = entry.age.as_secs(),
                    ttl_secs = self.ttl.as_secs(),
                    fresh,
                    "Checked cache freshness"
                );
                fresh
            }
            None => false,
        }
    }

    /// Load the stored snapshot of a target, regardless of its age
    pub async fn read(&self, target: &Target) -> Result<StatusRecord> {
        let path = self.path_for(target);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(CacheError::NotFound(path).into());
            }
            Err(e) => return Err(StatusError::Io(e)),
        };

        // `null` is what an empty touch left behind in older cache files
        let record: Option<StatusRecord> =
            serde_json::from_slice(&bytes).map_err(|e| CacheError::CorruptCache {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        debug!(path = %path.display(), len = bytes.len(), "Loaded cached status");
        Ok(record.unwrap_or_default())
    }

    /// Persist the snapshot of a target, replacing any previous one
    pub async fn write(&self, target: &Target, record: &StatusRecord) -> Result<()> {
        let path = self.path_for(target);
        let payload = serde_json::to_vec(record).map_err(|e| CacheError::WriteFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        tokio::fs::create_dir_all(&self.dir).await?;

        let tmp = tmp_path(&path);
        if let Err(e) = tokio::fs::write(&tmp, &payload).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::WriteFailed {
                path,
                reason: e.to_string(),
            }
            .into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CacheError::WriteFailed {
                path,
                reason: e.to_string(),
            }
            .into());
        }

        debug!(path = %path.display(), len = payload.len(), "Wrote cached status");
        Ok(())
    }

    /// Rewrite the stored snapshot unchanged, refreshing its modification time
    pub async fn touch(&self, target: &Target) -> Result<StatusRecord> {
        let record = self.read(target).await?;
        self.write(target, &record).await?;
        Ok(record)
    }
}

/// Map a host to a file stem that stays inside the cache directory
///
/// The mapping is injective: `%` is always escaped, so every `%XX` in the
/// output stands for exactly one input byte.
fn sanitize_host(host: &str) -> String {
    if host.is_empty() {
        // No encoded host is a lone `%`
        return "%".to_string();
    }

    let mut stem = String::with_capacity(host.len());
    for (i, byte) in host.bytes().enumerate() {
        let keep = byte.is_ascii_alphanumeric() || byte == b'-' || (byte == b'.' && i > 0);
        if keep {
            stem.push(char::from(byte));
        } else {
            stem.push_str(&format!("%{:02X}", byte));
        }
    }
    stem
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(
        ".{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    PathBuf::from(name)
}
