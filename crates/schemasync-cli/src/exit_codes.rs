//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - unreadable or invalid configuration file
pub const CONFIG_ERROR: i32 = 2;

/// Repository error - schema checkouts missing or malformed
pub const REPOSITORY_ERROR: i32 = 3;

/// Cluster error - Kubernetes unreachable or rejecting requests
pub const CLUSTER_ERROR: i32 = 4;

/// Sync error - at least one schema failed to synchronize
pub const SYNC_ERROR: i32 = 5;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 6;
