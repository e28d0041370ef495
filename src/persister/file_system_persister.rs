//! Persister over a storage engine and a resolver

use super::{
    run_blocking, DiskAllErase, DiskAllRead, DiskRead, DiskWrite, FsAllEraser, FsAllReader,
    FsReader, FsWriter, Persister, PersisterStats, RecordProvider, StatsSnapshot,
};
use crate::config::StoreConfig;
use crate::error::{PersistError, Result};
use crate::fs::{FileSystem, LocalFileSystem, RecordState};
use crate::resolver::PathResolver;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Default age after which an entry reports [`RecordState::Stale`]
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Keyed persistence over a [`FileSystem`].
///
/// Combines the single-entry reader and writer with the bulk adapters and
/// keeps hit/miss/write counters. Cloning is cheap and clones share the
/// engine and counters.
pub struct FileSystemPersister<K: ?Sized, R> {
    file_system: Arc<dyn FileSystem>,
    resolver: Arc<R>,
    reader: FsReader<K, R>,
    writer: FsWriter<K, R>,
    all_reader: FsAllReader,
    eraser: FsAllEraser,
    stale_after: Duration,
    stats: Arc<PersisterStats>,
}

impl<K: ?Sized, R> FileSystemPersister<K, R> {
    pub fn new(file_system: Arc<dyn FileSystem>, resolver: R) -> Self {
        let resolver = Arc::new(resolver);
        Self {
            reader: FsReader::new(Arc::clone(&file_system), Arc::clone(&resolver)),
            writer: FsWriter::new(Arc::clone(&file_system), Arc::clone(&resolver)),
            all_reader: FsAllReader::new(Arc::clone(&file_system)),
            eraser: FsAllEraser::new(Arc::clone(&file_system)),
            file_system,
            resolver,
            stale_after: DEFAULT_STALE_AFTER,
            stats: Arc::new(PersisterStats::new()),
        }
    }

    /// Open a local store as described by `config`
    pub fn from_config(config: &StoreConfig, resolver: R) -> Result<Self> {
        let file_system = LocalFileSystem::from_config(config)?;
        tracing::info!(
            root_dir = %config.root_dir,
            sync_writes = config.sync_writes,
            stale_after_seconds = config.stale_after_seconds,
            "Opened file system persister"
        );
        Ok(Self::new(Arc::new(file_system), resolver).with_stale_after(config.stale_after()))
    }

    /// Age after which [`RecordProvider::record_state`] reports `Stale`
    pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

impl<K: ?Sized, R: PathResolver<K>> FileSystemPersister<K, R> {
    /// Path the entry for `key` lives at
    pub fn resolve(&self, key: &K) -> Result<String> {
        self.resolver.resolve(key)
    }

    /// Whether an entry exists for `key`
    pub async fn exists(&self, key: &K) -> Result<bool> {
        let path = self.resolve(key)?;
        let file_system = Arc::clone(&self.file_system);
        run_blocking(move || file_system.exists(&path)).await
    }
}

impl<K: ?Sized, R> Clone for FileSystemPersister<K, R> {
    fn clone(&self) -> Self {
        Self {
            file_system: Arc::clone(&self.file_system),
            resolver: Arc::clone(&self.resolver),
            reader: self.reader.clone(),
            writer: self.writer.clone(),
            all_reader: self.all_reader.clone(),
            eraser: self.eraser.clone(),
            stale_after: self.stale_after,
            stats: Arc::clone(&self.stats),
        }
    }
}

#[async_trait]
impl<K, R> DiskRead<K> for FileSystemPersister<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn read(&self, key: &K) -> Result<Bytes> {
        match self.reader.read(key).await {
            Ok(data) => {
                self.stats.record_hit(data.len());
                Ok(data)
            }
            Err(e) => {
                if e.is_not_found() {
                    self.stats.record_miss();
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl<K, R> DiskWrite<K> for FileSystemPersister<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn write(&self, key: &K, data: Bytes) -> Result<bool> {
        let len = data.len();
        let written = self.writer.write(key, data).await?;
        self.stats.record_write(len);
        Ok(written)
    }
}

#[async_trait]
impl<K, R> DiskAllRead for FileSystemPersister<K, R>
where
    K: ?Sized,
    R: Send + Sync,
{
    async fn read_all(&self, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        self.all_reader.read_all(prefix).await
    }
}

#[async_trait]
impl<K, R> DiskAllErase for FileSystemPersister<K, R>
where
    K: ?Sized,
    R: Send + Sync,
{
    async fn delete_all(&self, prefix: &str) -> Result<bool> {
        self.eraser.delete_all(prefix).await
    }
}

#[async_trait]
impl<K, R> RecordProvider<K> for FileSystemPersister<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn record_state(&self, key: &K) -> Result<RecordState> {
        let path = self.resolve(key)?;
        let file_system = Arc::clone(&self.file_system);
        let stale_after = self.stale_after;
        run_blocking(move || file_system.record_state(&path, stale_after)).await
    }
}

#[async_trait]
impl<K, R> Persister<K> for FileSystemPersister<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn delete(&self, key: &K) -> Result<bool> {
        let path = self.resolve(key)?;
        let file_system = Arc::clone(&self.file_system);

        match run_blocking(move || file_system.delete(&path)).await {
            Ok(()) => {
                self.stats.record_delete();
                Ok(true)
            }
            Err(PersistError::NotFound(path)) => {
                tracing::debug!(path = %path, "Delete of absent entry");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let prefix = prefix.to_string();
        let file_system = Arc::clone(&self.file_system);
        run_blocking(move || file_system.list(&prefix)).await
    }
}
