//! Write and erase adapters

use super::{run_blocking, DiskAllErase, DiskWrite};
use crate::error::Result;
use crate::fs::FileSystem;
use crate::resolver::PathResolver;
use async_trait::async_trait;
use bytes::Bytes;
use std::marker::PhantomData;
use std::sync::Arc;

/// Writes single entries by key
pub struct FsWriter<K: ?Sized, R> {
    file_system: Arc<dyn FileSystem>,
    resolver: Arc<R>,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, R> FsWriter<K, R> {
    pub fn new(file_system: Arc<dyn FileSystem>, resolver: Arc<R>) -> Self {
        Self {
            file_system,
            resolver,
            _key: PhantomData,
        }
    }
}

impl<K: ?Sized, R> Clone for FsWriter<K, R> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.file_system), Arc::clone(&self.resolver))
    }
}

#[async_trait]
impl<K, R> DiskWrite<K> for FsWriter<K, R>
where
    K: ?Sized + Sync,
    R: PathResolver<K>,
{
    async fn write(&self, key: &K, data: Bytes) -> Result<bool> {
        let path = self.resolver.resolve(key)?;
        let file_system = Arc::clone(&self.file_system);

        run_blocking(move || file_system.write(&path, &data)).await?;
        Ok(true)
    }
}

/// Deletes whole subtrees
#[derive(Clone)]
pub struct FsAllEraser {
    file_system: Arc<dyn FileSystem>,
}

impl FsAllEraser {
    pub fn new(file_system: Arc<dyn FileSystem>) -> Self {
        Self { file_system }
    }
}

#[async_trait]
impl DiskAllErase for FsAllEraser {
    async fn delete_all(&self, prefix: &str) -> Result<bool> {
        let prefix = prefix.to_string();
        let file_system = Arc::clone(&self.file_system);

        run_blocking(move || file_system.delete_all(&prefix)).await?;
        Ok(true)
    }
}
