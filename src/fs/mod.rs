//! Storage engines
//!
//! This module provides the [`FileSystem`] contract and two engines:
//! - **LocalFileSystem**: plain files under a root directory, staged writes
//! - **MemoryFileSystem**: shared in-memory map with failure simulation
//!
//! Paths are root-relative, slash-separated and canonicalised by
//! [`path::simplify`] before any engine sees them.

pub mod backend;
mod local;
mod memory;
pub mod path;

pub use self::backend::{FileSystem, RecordState};
pub use self::local::LocalFileSystem;
pub use self::memory::MemoryFileSystem;
