//! Resolver for string keys that carry their own path structure

use super::{check_rendered, encode_component, join_segments, PathResolver};
use crate::error::Result;

/// Resolves `"images/2024/cat.jpg"` to `/images/2024/cat.jpg`.
///
/// The key's own `/` separators become directories; every segment is
/// percent-encoded. One leading `/` is ignored, so `"/a"` and `"a"` share an
/// entry. Empty, `.` and `..` segments make the key invalid.
#[derive(Debug, Clone, Default)]
pub struct SegmentPathResolver {
    namespace: Option<String>,
}

impl SegmentPathResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place every resolved path under `/{namespace}`
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: Some(namespace.into()),
        }
    }

    fn render_str(&self, key: &str) -> Result<String> {
        let trimmed = key.strip_prefix('/').unwrap_or(key);

        let mut segments = Vec::new();
        if let Some(namespace) = &self.namespace {
            segments.push(encode_component(namespace)?);
        }
        for segment in trimmed.split('/') {
            segments.push(encode_component(segment)?);
        }
        join_segments(&segments)
    }
}

impl PathResolver<str> for SegmentPathResolver {
    fn resolve(&self, key: &str) -> Result<String> {
        check_rendered(self.render_str(key)?)
    }

    fn render(&self, key: &str) -> Result<String> {
        self.render_str(key)
    }
}

impl PathResolver<String> for SegmentPathResolver {
    fn resolve(&self, key: &String) -> Result<String> {
        check_rendered(self.render_str(key)?)
    }

    fn render(&self, key: &String) -> Result<String> {
        self.render_str(key)
    }
}
