//! Filesystem-backed storage engine
//!
//! Entries are plain files under the root directory, one per canonical path.
//! Writes are staged: content goes to a uniquely named sibling file which is
//! flushed and then renamed over the target, so the final name only ever
//! points at complete content. No in-process lock is taken; rename and
//! unlink atomicity provide the visibility guarantees.
//!
//! A write whose parent directory is removed by a concurrent `delete_all`
//! recreates it and retries once. Losing that race twice surfaces as
//! `Io` with `ErrorKind::NotFound`.

use super::backend::FileSystem;
use super::path;
use crate::config::StoreConfig;
use crate::error::{is_missing, PersistError, Result};
use bytes::Bytes;
use std::fs;
use std::io::{self, Write};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Storage engine over a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalFileSystem {
    root: PathBuf,
    sync_writes: bool,
}

impl LocalFileSystem {
    /// Open a store rooted at `root`, creating the directory if it is absent
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::debug!(root = %root.display(), "Opened local file system");
        Ok(Self {
            root,
            sync_writes: true,
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(&config.root_dir)?.with_sync_writes(config.sync_writes))
    }

    /// Toggle fsync of staged content and parent directories.
    ///
    /// Disabling keeps rename atomicity but gives up durability across power
    /// loss.
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, path: &str) -> Result<(String, PathBuf)> {
        let canonical = path::simplify(path)?;
        let native = path::to_native(&self.root, &canonical);
        Ok((canonical, native))
    }

    fn locate_entry(&self, path: &str) -> Result<(String, PathBuf)> {
        let (canonical, native) = self.locate(path)?;
        if path::is_root(&canonical) {
            return Err(PersistError::invalid_path(
                path,
                "the root directory cannot hold an entry",
            ));
        }
        Ok((canonical, native))
    }

    fn write_staged(&self, staging: &Path, target: &Path, data: &[u8]) -> io::Result<()> {
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(staging)?;
        file.write_all(data)?;
        if self.sync_writes {
            file.sync_all()?;
        }
        drop(file);

        fs::rename(staging, target)?;

        if self.sync_writes {
            if let Some(parent) = target.parent() {
                sync_dir(parent)?;
            }
        }
        Ok(())
    }

    fn write_attempt(
        &self,
        parent: &Path,
        file_name: &OsStr,
        target: &Path,
        data: &[u8],
    ) -> io::Result<()> {
        let staging = parent.join(path::staging_name(&file_name.to_string_lossy()));
        let result = self.write_staged(&staging, target, data);
        if result.is_err() {
            let _ = fs::remove_file(&staging);
        }
        result
    }

    fn collect_entries(&self, dir: &Path, canonical: &str, out: &mut Vec<String>) -> io::Result<()> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            // Removed underneath us by a concurrent delete_all
            Err(e) if is_missing(&e) => return Ok(()),
            Err(e) => return Err(e),
        };

        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                tracing::debug!(dir = %dir.display(), "Skipping non UTF-8 file name");
                continue;
            };
            let child = path::join(canonical, name);
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                self.collect_entries(&entry.path(), &child, out)?;
            } else if file_type.is_file() && !path::is_staging_name(name) {
                out.push(child);
            }
        }
        Ok(())
    }
}

impl FileSystem for LocalFileSystem {
    fn write(&self, path: &str, data: &[u8]) -> Result<()> {
        let (canonical, target) = self.locate_entry(path)?;
        let (Some(parent), Some(file_name)) = (target.parent(), target.file_name()) else {
            return Err(PersistError::invalid_path(path, "no parent directory"));
        };
        fs::create_dir_all(parent)?;

        let mut result = self.write_attempt(parent, file_name, &target, data);
        if matches!(&result, Err(e) if e.kind() == io::ErrorKind::NotFound) {
            // A concurrent delete_all removed the parent; recreate it once
            tracing::debug!(path = %canonical, "Parent directory vanished, retrying write");
            fs::create_dir_all(parent)?;
            result = self.write_attempt(parent, file_name, &target, data);
        }
        if let Err(e) = result {
            tracing::warn!(path = %canonical, error = %e, "Staged write failed");
            return Err(PersistError::Io(e));
        }

        tracing::debug!(path = %canonical, bytes = data.len(), "Wrote entry");
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Bytes> {
        let (canonical, target) = self.locate_entry(path)?;
        let metadata = fs::metadata(&target).map_err(|e| PersistError::from_io(&canonical, e))?;
        if metadata.is_dir() {
            return Err(PersistError::NotFound(canonical));
        }
        let data = fs::read(&target).map_err(|e| PersistError::from_io(&canonical, e))?;
        Ok(Bytes::from(data))
    }

    fn delete(&self, path: &str) -> Result<()> {
        let (canonical, target) = self.locate_entry(path)?;
        let metadata =
            fs::symlink_metadata(&target).map_err(|e| PersistError::from_io(&canonical, e))?;
        if metadata.is_dir() {
            return Err(PersistError::NotFound(canonical));
        }
        fs::remove_file(&target).map_err(|e| PersistError::from_io(&canonical, e))?;
        tracing::debug!(path = %canonical, "Deleted entry");
        Ok(())
    }

    fn delete_all(&self, prefix: &str) -> Result<()> {
        let (canonical, target) = self.locate(prefix)?;

        if path::is_root(&canonical) {
            // Empty the root but keep the directory itself
            let entries = match fs::read_dir(&self.root) {
                Ok(entries) => entries,
                Err(e) if is_missing(&e) => return Ok(()),
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                remove_tree(&entry?.path())?;
            }
        } else {
            remove_tree(&target)?;
        }

        tracing::debug!(prefix = %canonical, "Deleted subtree");
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let (canonical, target) = self.locate(prefix)?;
        let mut out = Vec::new();

        match fs::symlink_metadata(&target) {
            Ok(metadata) if metadata.is_dir() => {
                self.collect_entries(&target, &canonical, &mut out)?;
            }
            Ok(metadata) if metadata.is_file() => out.push(canonical),
            Ok(_) => {}
            Err(e) if is_missing(&e) => {}
            Err(e) => return Err(e.into()),
        }
        Ok(out)
    }

    fn exists(&self, path: &str) -> Result<bool> {
        let (_, target) = self.locate_entry(path)?;
        match fs::metadata(&target) {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if is_missing(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn last_modified(&self, path: &str) -> Result<SystemTime> {
        let (canonical, target) = self.locate_entry(path)?;
        let metadata = fs::metadata(&target).map_err(|e| PersistError::from_io(&canonical, e))?;
        if metadata.is_dir() {
            return Err(PersistError::NotFound(canonical));
        }
        Ok(metadata.modified()?)
    }
}

/// Remove `path` and everything below it.
///
/// Entries that vanish concurrently are ignored. A directory repopulated by a
/// racing write is left in place; that entry simply survives the delete.
fn remove_tree(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if is_missing(&e) => return Ok(()),
        Err(e) => return Err(e),
    };

    if !metadata.is_dir() {
        return match fs::remove_file(path) {
            Err(e) if !is_missing(&e) => Err(e),
            _ => Ok(()),
        };
    }

    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                remove_tree(&entry?.path())?;
            }
        }
        Err(e) if is_missing(&e) => return Ok(()),
        Err(e) => return Err(e),
    }

    match fs::remove_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if is_missing(&e) => Ok(()),
        Err(e) if is_not_empty(&e) => {
            tracing::debug!(dir = %path.display(), "Directory repopulated during delete");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn is_not_empty(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENOTEMPTY)
}

#[cfg(not(unix))]
fn is_not_empty(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_root_directory_if_missing() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("nested").join("store");
        assert!(!root.exists());

        let store = LocalFileSystem::new(&root).unwrap();
        assert!(root.is_dir());
        assert_eq!(store.root(), root.as_path());
    }

    #[test]
    fn test_entry_is_plain_file_with_exact_bytes() {
        // No header, checksum or sidecar next to the entry
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();

        store.write("/docs/readme.txt", b"raw bytes").unwrap();

        let native = temp_dir.path().join("docs").join("readme.txt");
        assert_eq!(fs::read(&native).unwrap(), b"raw bytes");
        let siblings: Vec<_> = fs::read_dir(temp_dir.path().join("docs"))
            .unwrap()
            .collect();
        assert_eq!(siblings.len(), 1);
    }

    #[test]
    fn test_no_staging_file_left_after_write() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();

        store.write("/a/b", b"one").unwrap();
        store.write("/a/b", b"two").unwrap();

        let names: Vec<String> = fs::read_dir(temp_dir.path().join("a"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn test_list_skips_staging_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();
        store.write("/a/visible", b"x").unwrap();

        // Simulate a write interrupted mid-staging
        let leftover = temp_dir.path().join("a").join(path::staging_name("visible"));
        fs::write(&leftover, b"partial").unwrap();

        assert_eq!(store.list("/").unwrap(), vec!["/a/visible".to_string()]);
        assert_eq!(store.read("/a/visible").unwrap(), Bytes::from_static(b"x"));
    }

    #[test]
    fn test_failed_write_cleans_up_staging_file() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();

        // A directory at the target makes the rename fail
        fs::create_dir_all(temp_dir.path().join("a").join("b").join("c")).unwrap();
        let result = store.write("/a/b", b"data");
        assert!(matches!(result, Err(PersistError::Io(_))));

        let names: Vec<String> = fs::read_dir(temp_dir.path().join("a"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["b".to_string()]);
    }

    #[test]
    fn test_read_directory_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();
        store.write("/dir/file", b"x").unwrap();

        assert!(store.read("/dir").unwrap_err().is_not_found());
        assert!(store.delete("/dir").unwrap_err().is_not_found());
        assert!(!store.exists("/dir").unwrap());
    }

    #[test]
    fn test_root_cannot_hold_an_entry() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();

        let err = store.write("/", b"x").unwrap_err();
        assert!(matches!(err, PersistError::InvalidPath { .. }));
    }

    #[test]
    fn test_traversal_never_touches_outside_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let store = LocalFileSystem::new(&root).unwrap();

        let err = store.write("../outside.txt", b"x").unwrap_err();
        assert!(matches!(err, PersistError::InvalidPath { .. }));
        assert!(!temp_dir.path().join("outside.txt").exists());

        let err = store.delete_all("/../").unwrap_err();
        assert!(matches!(err, PersistError::InvalidPath { .. }));
        assert!(root.exists());
    }

    #[test]
    fn test_delete_all_root_keeps_root_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();
        store.write("/x/y/z", b"1").unwrap();
        store.write("/top", b"2").unwrap();

        store.delete_all("/").unwrap();

        assert!(temp_dir.path().is_dir());
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_delete_all_removes_prefix_directory() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path()).unwrap();
        store.write("/keep/a", b"1").unwrap();
        store.write("/drop/a", b"2").unwrap();
        store.write("/drop/nested/b", b"3").unwrap();

        store.delete_all("/drop").unwrap();

        assert!(!temp_dir.path().join("drop").exists());
        assert_eq!(store.list("/").unwrap(), vec!["/keep/a".to_string()]);
    }

    #[test]
    fn test_write_recreates_root_removed_externally() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("store");
        let store = LocalFileSystem::new(&root).unwrap();
        fs::remove_dir_all(&root).unwrap();

        assert!(store.list("/").unwrap().is_empty());
        store.write("/a", b"back").unwrap();
        assert_eq!(store.read("/a").unwrap(), Bytes::from_static(b"back"));
    }

    #[test]
    fn test_unsynced_writes_still_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalFileSystem::new(temp_dir.path())
            .unwrap()
            .with_sync_writes(false);

        store.write("/fast", b"no fsync").unwrap();
        assert_eq!(store.read("/fast").unwrap(), Bytes::from_static(b"no fsync"));
    }

    #[test]
    fn test_from_config_uses_root_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = StoreConfig {
            root_dir: temp_dir.path().join("cfg").to_string_lossy().to_string(),
            ..StoreConfig::default()
        };

        let store = LocalFileSystem::from_config(&config).unwrap();
        assert!(temp_dir.path().join("cfg").is_dir());
        assert!(store.sync_writes);
    }

    #[test]
    fn test_local_file_system_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LocalFileSystem>();
    }
}
