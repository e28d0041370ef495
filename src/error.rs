//! Error types for persistence operations

use thiserror::Error;

/// Every failure the storage layer can report.
///
/// `NotFound` is the normal cache-miss outcome. The other variants are
/// environment or programming errors and are surfaced verbatim; nothing in
/// this crate retries them.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The resolver could not render the key into a legal path
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// The path escapes the root or contains characters the store rejects
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// No entry exists at the path
    #[error("Entry not found: {0}")]
    NotFound(String),

    /// Underlying medium error (disk full, permission denied, device error)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking filesystem task was cancelled or panicked
    #[error("Background task failed: {0}")]
    Task(String),
}

impl PersistError {
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        PersistError::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map an I/O error raised while touching `path`, keeping misses typed.
    pub fn from_io(path: &str, err: std::io::Error) -> Self {
        if is_missing(&err) {
            PersistError::NotFound(path.to_string())
        } else {
            PersistError::Io(err)
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistError::NotFound(_))
    }
}

impl From<tokio::task::JoinError> for PersistError {
    fn from(err: tokio::task::JoinError) -> Self {
        PersistError::Task(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PersistError>;

/// Whether `err` means nothing exists at the path.
///
/// An ancestor that is a file (`ENOTDIR`) is a miss too: `/a/b` cannot exist
/// while `/a` is an entry.
pub fn is_missing(err: &std::io::Error) -> bool {
    err.kind() == std::io::ErrorKind::NotFound || is_not_a_directory(err)
}

#[cfg(unix)]
fn is_not_a_directory(err: &std::io::Error) -> bool {
    err.raw_os_error() == Some(libc::ENOTDIR)
}

#[cfg(not(unix))]
fn is_not_a_directory(_err: &std::io::Error) -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_io_maps_not_found_to_typed_miss() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = PersistError::from_io("/a/b", io_err);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Entry not found: /a/b");
    }

    #[cfg(unix)]
    #[test]
    fn test_from_io_maps_not_a_directory_to_typed_miss() {
        let io_err = std::io::Error::from_raw_os_error(libc::ENOTDIR);
        let err = PersistError::from_io("/a/b", io_err);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_io_keeps_other_kinds_as_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PersistError::from_io("/a/b", io_err);
        assert!(matches!(err, PersistError::Io(_)));
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_invalid_path_display_names_path_and_reason() {
        let err = PersistError::invalid_path("/../x", "escapes root");
        let display = format!("{}", err);
        assert!(display.contains("/../x"));
        assert!(display.contains("escapes root"));
    }

    #[test]
    fn test_persist_error_implements_error_trait() {
        fn assert_error<T: std::error::Error + Send + Sync + 'static>() {}
        assert_error::<PersistError>();
    }
}
