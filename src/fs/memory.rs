//! In-memory storage engine (BTreeMap storage)
//!
//! Implements the same contract as the local backend, including rejecting a
//! write whose path runs through an existing entry. Useful as a test double
//! and for ephemeral stores. Failure switches simulate medium errors.

use super::backend::FileSystem;
use super::path;
use crate::error::{PersistError, Result};
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct StoredEntry {
    data: Bytes,
    modified: SystemTime,
}

/// Storage engine that keeps every entry in a shared map
#[derive(Debug, Clone, Default)]
pub struct MemoryFileSystem {
    entries: Arc<RwLock<BTreeMap<String, StoredEntry>>>,
    /// Simulate errors if true
    simulate_storage_full: Arc<AtomicBool>,
    simulate_permission_denied: Arc<AtomicBool>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail as if the medium were full
    pub fn set_storage_full(&self, enabled: bool) {
        self.simulate_storage_full.store(enabled, Ordering::SeqCst);
    }

    /// Make every operation fail with permission denied
    pub fn set_permission_denied(&self, enabled: bool) {
        self.simulate_permission_denied
            .store(enabled, Ordering::SeqCst);
    }

    /// Number of stored entries
    pub fn entry_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Override the modification time of an entry, e.g. to age it in tests
    pub fn set_modified(&self, path: &str, modified: SystemTime) -> Result<()> {
        let canonical = path::simplify(path)?;
        let mut entries = self.entries.write();
        let entry = entries
            .get_mut(&canonical)
            .ok_or(PersistError::NotFound(canonical.clone()))?;
        entry.modified = modified;
        Ok(())
    }

    fn check_access(&self) -> Result<()> {
        if self.simulate_permission_denied.load(Ordering::SeqCst) {
            return Err(PersistError::Io(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "Simulated permission denied",
            )));
        }
        Ok(())
    }

    fn locate_entry(&self, path: &str) -> Result<String> {
        self.check_access()?;
        let canonical = path::simplify(path)?;
        if path::is_root(&canonical) {
            return Err(PersistError::invalid_path(
                path,
                "the root directory cannot hold an entry",
            ));
        }
        Ok(canonical)
    }
}

impl FileSystem for MemoryFileSystem {
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let canonical = self.locate_entry(path)?;
        if self.simulate_storage_full.load(Ordering::SeqCst) {
            return Err(PersistError::Io(io::Error::new(
                io::ErrorKind::Other,
                "Simulated storage full",
            )));
        }

        let mut entries = self.entries.write();

        // An entry cannot also be a directory on the way to another entry
        let mut ancestor = canonical.as_str();
        while let Some(idx) = ancestor.rfind('/') {
            ancestor = &ancestor[..idx];
            if !ancestor.is_empty() && entries.contains_key(ancestor) {
                return Err(PersistError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("'{}' is an entry, not a directory", ancestor),
                )));
            }
        }
        let children = format!("{}/", canonical);
        if entries
            .range(children.clone()..)
            .next()
            .is_some_and(|(key, _)| key.starts_with(&children))
        {
            return Err(PersistError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("'{}' is a directory", canonical),
            )));
        }

        entries.insert(
            canonical,
            StoredEntry {
                data: Bytes::copy_from_slice(data),
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let canonical = self.locate_entry(path)?;
        self.entries
            .read()
            .get(&canonical)
            .map(|entry| entry.data.clone())
            .ok_or(PersistError::NotFound(canonical))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let canonical = self.locate_entry(path)?;
        match self.entries.write().remove(&canonical) {
            Some(_) => Ok(()),
            None => Err(PersistError::NotFound(canonical)),
        }
    }

    fn delete_all(&self, prefix: &str) -> Result<()> {
        self.check_access()?;
        let canonical = path::simplify(prefix)?;
        self.entries
            .write()
            .retain(|key, _| !path::is_within(key, &canonical));
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        self.check_access()?;
        let canonical = path::simplify(prefix)?;
        Ok(self
            .entries
            .read()
            .range(canonical.clone()..)
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(&canonical))
            .filter(|key| path::is_within(key, &canonical))
            .cloned()
            .collect())
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let canonical = self.locate_entry(path)?;
        Ok(self.entries.read().contains_key(&canonical))
    }

    fn last_modified(&self, path: &str) -> Result<SystemTime> {
        let canonical = self.locate_entry(path)?;
        self.entries
            .read()
            .get(&canonical)
            .map(|entry| entry.modified)
            .ok_or(PersistError::NotFound(canonical))
    }
}
