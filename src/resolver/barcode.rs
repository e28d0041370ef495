//! Two-part keys: a record type plus an identifier within that type

use super::{check_rendered, encode_component, join_segments, PathResolver};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key made of a record type and a key within that type
#[derive(Debug, Clone, Hash, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarCode {
    /// Record type, e.g. "article"
    pub kind: String,
    /// Identifier within the type
    pub key: String,
}

impl BarCode {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for BarCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.key)
    }
}

/// Resolves a [`BarCode`] to `/{kind}/{key}`.
///
/// Both parts are percent-encoded into single segments, so a `/` inside the
/// key cannot create extra nesting and `("a", "b/c")` never collides with
/// `("a/b", "c")`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BarCodePathResolver;

impl BarCodePathResolver {
    pub fn new() -> Self {
        Self
    }
}

impl PathResolver<BarCode> for BarCodePathResolver {
    fn resolve(&self, key: &BarCode) -> Result<String> {
        check_rendered(self.render(key)?)
    }

    fn render(&self, key: &BarCode) -> Result<String> {
        join_segments(&[encode_component(&key.kind)?, encode_component(&key.key)?])
    }
}
