//! Key to path resolution
//!
//! A [`PathResolver`] turns a caller's key into the canonical path of its
//! entry. Resolution is pure: no I/O, no state, and equal keys always map to
//! the same path.
//!
//! Resolvers do not guard against two distinct keys mapping to the same
//! path. A resolver that collides keys makes them share one entry, and the
//! last write wins; choosing an injective mapping is the caller's job.

mod barcode;
mod hashed;
mod segment;

pub use self::barcode::{BarCode, BarCodePathResolver};
pub use self::hashed::HashedPathResolver;
pub use self::segment::SegmentPathResolver;

use crate::error::{PersistError, Result};
use crate::fs::path;

/// Deterministic mapping from keys of type `K` to canonical paths
pub trait PathResolver<K: ?Sized>: Send + Sync {
    /// Render `key` as a canonical path, `InvalidKey` if it cannot be
    fn resolve(&self, key: &K) -> Result<String>;

    /// Path-shaped form of `key` before segment limits apply.
    ///
    /// Wrapping resolvers such as [`HashedPathResolver`] digest this, so keys
    /// too long to store directly still resolve through them.
    fn render(&self, key: &K) -> Result<String> {
        self.resolve(key)
    }
}

/// Percent-encode one key component without applying segment limits
pub(crate) fn encode_component(component: &str) -> Result<String> {
    let encoded = urlencoding::encode(component).into_owned();
    if encoded.is_empty() || encoded == "." || encoded == ".." {
        return Err(PersistError::InvalidKey(format!(
            "'{}': not a renderable component",
            component
        )));
    }
    Ok(encoded)
}

/// Percent-encode one key component into a single legal path segment
pub(crate) fn encode_segment(component: &str) -> Result<String> {
    let encoded = encode_component(component)?;
    path::check_segment(&encoded)
        .map_err(|reason| PersistError::InvalidKey(format!("'{}': {}", component, reason)))?;
    Ok(encoded)
}

/// Apply segment limits to a rendered path
pub(crate) fn check_rendered(rendered: String) -> Result<String> {
    for segment in rendered.split('/').filter(|s| !s.is_empty()) {
        path::check_segment(segment)
            .map_err(|reason| PersistError::InvalidKey(format!("'{}': {}", segment, reason)))?;
    }
    Ok(rendered)
}

/// Join already-validated segments into a canonical path
pub(crate) fn join_segments<S: AsRef<str>>(segments: &[S]) -> Result<String> {
    if segments.is_empty() {
        return Err(PersistError::InvalidKey(
            "key renders to no path segments".to_string(),
        ));
    }
    let mut rendered = String::new();
    for segment in segments {
        rendered.push('/');
        rendered.push_str(segment.as_ref());
    }
    Ok(rendered)
}
