//! Canonical path handling for the storage root
//!
//! Every path handed to a [`FileSystem`](super::FileSystem) is first reduced to
//! the canonical form `/seg/seg/...` (or `/` for the root itself). The
//! canonical form is what `list` returns and what resolvers produce, so two
//! spellings of the same location always compare equal.

use crate::error::{PersistError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The root of the storage namespace
pub const ROOT: &str = "/";

/// Suffix carried by in-flight staging files
pub const STAGING_SUFFIX: &str = ".staging";

/// Longest segment accepted, leaving room for the staging decoration under
/// the common 255-byte file name limit
pub const MAX_SEGMENT_LEN: usize = 200;

/// Reduce `path` to canonical form.
///
/// Repeated slashes collapse, `.` segments vanish and `..` pops the previous
/// segment. A `..` that would climb above the root is rejected rather than
/// clamped. Empty input names the root.
pub fn simplify(path: &str) -> Result<String> {
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(PersistError::invalid_path(
                        path,
                        "escapes the storage root",
                    ));
                }
            }
            other => stack.push(other),
        }
    }

    for segment in &stack {
        check_segment(segment).map_err(|reason| PersistError::invalid_path(path, reason))?;
    }

    if stack.is_empty() {
        return Ok(ROOT.to_string());
    }
    Ok(format!("/{}", stack.join("/")))
}

/// Check one path segment against the store's naming rules.
///
/// Returns the reason on rejection so callers can wrap it in whichever error
/// variant fits (`InvalidPath` for raw paths, `InvalidKey` for resolvers).
pub fn check_segment(segment: &str) -> std::result::Result<(), String> {
    if segment.is_empty() {
        return Err("empty segment".to_string());
    }
    if segment == "." || segment == ".." {
        return Err(format!("traversal segment '{}'", segment));
    }
    if segment.contains('\0') {
        return Err("segment contains a NUL byte".to_string());
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err("segment contains a path separator".to_string());
    }
    if segment.len() > MAX_SEGMENT_LEN {
        return Err(format!(
            "segment is {} bytes, limit is {}",
            segment.len(),
            MAX_SEGMENT_LEN
        ));
    }
    if is_staging_name(segment) {
        return Err("segment name is reserved for staged writes".to_string());
    }
    Ok(())
}

pub fn is_root(canonical: &str) -> bool {
    canonical == ROOT
}

/// Whether `name` is an in-flight staging file
pub fn is_staging_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(STAGING_SUFFIX)
}

/// Unique staging file name for a write targeting `file_name`
pub fn staging_name(file_name: &str) -> String {
    format!(".{}.{}{}", file_name, Uuid::new_v4().simple(), STAGING_SUFFIX)
}

/// Append one segment to a canonical path
pub fn join(parent: &str, name: &str) -> String {
    if is_root(parent) {
        format!("/{}", name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Whether canonical `path` lies inside (or is) canonical `prefix`
pub fn is_within(path: &str, prefix: &str) -> bool {
    if is_root(prefix) {
        return true;
    }
    path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

/// Map a canonical path onto the native filesystem below `root`
pub fn to_native(root: &Path, canonical: &str) -> PathBuf {
    canonical
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |acc, segment| acc.join(segment))
}
