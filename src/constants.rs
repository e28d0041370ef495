// Constants module - centralized default values for configuration
//
// Defaults for the store configuration and the CLI live here so the config
// layer and the binary agree on them.

// =============================================================================
// Store defaults
// =============================================================================

/// Default storage root directory
pub const DEFAULT_ROOT_DIR: &str = "/var/cache/fs-persister";

/// Default age in seconds after which an entry reports as stale (1 day)
pub const DEFAULT_STALE_AFTER_SECS: u64 = 24 * 60 * 60;

/// Writes are fsynced by default
pub const DEFAULT_SYNC_WRITES: bool = true;

// =============================================================================
// Logging defaults
// =============================================================================

/// Filter used when RUST_LOG is unset
pub const DEFAULT_LOG_FILTER: &str = "info";
