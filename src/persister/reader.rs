//! Read adapters

use super::{run_blocking, DiskAllRead, DiskRead};
use crate::error::{PersistError, Result};
use crate::fs::FileSystem;
use crate::resolver::PathResolver;
use async_trait::async_trait;
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;

/// Reads single entries by key.
///
/// Keys that resolve to the same path read the same entry; make sure keys
/// holding the same data resolve to the same path.
pub struct FsReader<K: ?Sized, R> {
    file_system: Arc<dyn FileSystem>,
    resolver: Arc<R>,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, R> FsReader<K, R> {
    pub fn new(file_system: Arc<dyn FileSystem>, resolver: Arc<R>) -> Self {
        Self {
            file_system,
            resolver,
            _key: PhantomData,
        }
    }
}

impl<K: ?Sized, R> Clone for FsReader<K, R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.file_system), Arc::clone(&self.resolver))
    }
}

#[async_trait]
impl<K, R> DiskRead<K> for FsReader<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn read(&self, key: &K) -> Result<Bytes> {
        let path = self.resolver.resolve(key)?;
        let file_system = Arc::clone(&self.file_system);

        let result = run_blocking(move || file_system.read(&path)).await;
        if let Err(PersistError::NotFound(path)) = &result {
            tracing::debug!(path = %path, "Entry not found");
        }
        result
    }
}

/// Reads every entry under a path prefix
#[derive(Clone)]
pub struct FsAllReader {
    file_system: Arc<dyn FileSystem>,
}

impl FsAllReader {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }
}

#[async_trait]
impl DiskAllRead for FsAllReader {
    /// An entry deleted between listing and reading fails the whole call
    /// with `NotFound`.
    async fn read_all(&self, prefix: &str) -> Result<Vec<(String, Bytes)>> {
        let prefix = prefix.to_string();
        let file_system = Arc::clone(&self.file_system);

        run_blocking(move || {
            file_system
                .list(&prefix)?
                .into_iter()
                .map(|path| {
                    let data = file_system.read(&path)?;
                    Ok((path, data))
                })
                .collect()
        })
        .await
    }
}
