//! Storage engine trait

use crate::error::{PersistError, Result};
use bytes::Bytes;
use std::time::{Duration, SystemTime};

/// Freshness of a stored entry relative to an expiry window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    /// Entry exists and was written within the window
    Fresh,
    /// Entry exists but is older than the window
    Stale,
    /// No entry at the path
    Missing,
}

/// Abstraction over the storage medium.
///
/// All paths are relative to the implementation's root and are canonicalised
/// with [`simplify`](super::path::simplify) before use, so `a/b`, `/a/b` and
/// `/a/./b` name the same entry. Calls are synchronous and may block; async
/// callers go through the adapters in [`crate::persister`].
pub trait FileSystem: Send + Sync {
    /// Store `data` at `path`, replacing any existing entry.
    ///
    /// Must be durable and atomically visible on success: a concurrent
    /// `read` sees either the previous complete content or `data`.
    fn write(&self, path: &str, data: &[u8]) -> Result<()>;

    /// Read the entry at `path`
    fn read(&self, path: &str) -> Result<Bytes>;

    /// Remove the entry at `path`, `NotFound` if there is none
    fn delete(&self, path: &str) -> Result<()>;

    /// Remove every entry under `prefix`. A missing prefix is a no-op.
    fn delete_all(&self, prefix: &str) -> Result<()>;

    /// Canonical paths of every entry under `prefix`, in no particular order
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Whether an entry exists at `path`
    fn exists(&self, path: &str) -> Result<bool>;

    /// Time the entry at `path` was last written
    fn last_modified(&self, path: &str) -> Result<SystemTime>;

    /// Classify the entry at `path` against `stale_after`
    fn record_state(&self, path: &str, stale_after: Duration) -> Result<RecordState> {
        match self.last_modified(path) {
            Ok(modified) => {
                // Clock skew can put mtime in the future; treat that as fresh
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);
                if age > stale_after {
                    Ok(RecordState::Stale)
                } else {
                    Ok(RecordState::Fresh)
                }
            }
            Err(PersistError::NotFound(_)) => Ok(RecordState::Missing),
            Err(e) => Err(e),
        }
    }
}
