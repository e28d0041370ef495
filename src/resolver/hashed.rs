//! Resolver that hashes another resolver's output into SHA256 file names

use super::{encode_segment, join_segments, PathResolver};
use crate::error::Result;
use sha2::{Digest, Sha256};

/// Wraps another resolver and stores its output under
/// `/{namespace}/{hh}/{sha256}`.
///
/// The inner resolver's [`render`](PathResolver::render) output is hashed,
/// so keys whose rendered form is too long or hostile for the filesystem
/// still map to a legal path. `hh` is the first two hex digits of the digest,
/// spreading entries over 256 shard directories. Distinct renderings only
/// collide if SHA256 does.
#[derive(Debug, Clone, Default)]
pub struct HashedPathResolver<R> {
    inner: R,
    namespace: Option<String>,
}

impl<R> HashedPathResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            namespace: None,
        }
    }

    pub fn with_namespace(inner: R, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            namespace: Some(namespace.into()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }
}

/// SHA256 of `bytes` as lowercase hex
pub fn key_to_hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

impl<K: ?Sized, R: PathResolver<K>> PathResolver<K> for HashedPathResolver<R> {
    fn resolve(&self, key: &K) -> Result<String> {
        let rendered = self.inner.render(key)?;
        let hash = key_to_hash(rendered.as_bytes());
        let shard = hash[..2].to_string();

        let mut segments = Vec::with_capacity(3);
        if let Some(namespace) = &self.namespace {
            segments.push(encode_segment(namespace)?);
        }
        segments.push(shard);
        segments.push(hash);
        join_segments(&segments)
    }
}
