//! Async adapters binding a storage engine to a key resolver
//!
//! The traits here are what the caching tier above consumes. Storage engines
//! block, so every adapter hands the engine call to tokio's blocking pool and
//! returns a single-shot future. Many key operations can be in flight at once;
//! dropping a future never leaves a partial entry behind because the engine's
//! writes are staged.

mod file_system_persister;
mod reader;
mod stats;
mod writer;

pub use self::file_system_persister::FileSystemPersister;
pub use self::reader::{FsAllReader, FsReader};
pub use self::stats::{PersisterStats, StatsSnapshot};
pub use self::writer::{FsAllEraser, FsWriter};

use crate::error::Result;
use crate::fs::RecordState;
use async_trait::async_trait;
use bytes::Bytes;

/// Single-entry reads keyed by `K`
#[async_trait]
pub trait DiskRead<K: ?Sized + Sync>: Send + Sync {
    /// Read the entry for `key`, `NotFound` if it was never written
    async fn read(&self, key: &K) -> Result<Bytes>;
}

/// Single-entry writes keyed by `K`
#[async_trait]
pub trait DiskWrite<K: ?Sized + Sync>: Send + Sync {
    /// Store `data` for `key`; `true` once the entry is durable
    async fn write(&self, key: &K, data: Bytes) -> Result<bool>;
}

/// Bulk reads over a path prefix
#[async_trait]
pub trait DiskAllRead: Send + Sync {
    /// Every entry under `prefix` with its path
    async fn read_all(&self, prefix: &str) -> Result<Vec<(String, Bytes)>>;
}

/// Bulk deletes over a path prefix
#[async_trait]
pub trait DiskAllErase: Send + Sync {
    async fn delete_all(&self, prefix: &str) -> Result<bool>;
}

/// Freshness queries keyed by `K`
#[async_trait]
pub trait RecordProvider<K: ?Sized + Sync>: Send + Sync {
    async fn record_state(&self, key: &K) -> Result<RecordState>;
}

/// Full contract exposed to the caching tier
#[async_trait]
pub trait Persister<K: ?Sized + Sync>: DiskRead<K> + DiskWrite<K> + DiskAllErase {
    /// Remove the entry for `key`; `false` if there was none
    async fn delete(&self, key: &K) -> Result<bool>;

    /// Paths of every entry under `prefix`
    async fn list(&self, prefix: &str) -> Result<Vec<String>>;
}

/// Run a blocking engine call on the blocking pool
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}
