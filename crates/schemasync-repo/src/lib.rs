//! schemasync Repository access
//!
//! This crate provides the repository side of synchronization:
//!
//! - **`RepositoryService`**: the interface the engine consumes (schema listing, snapshots)
//! - **Filesystem repository**: every schema branch is a checked-out directory below a root
//! - **Mock repository**: in-memory snapshots with failure injection for tests
//! - **Watcher**: publishes repository update events when a checkout changes on disk
//!
//! ## Layout
//!
//! ```text
//! <root>/<schema>/settings.yaml            kind: SettingsFile
//! <root>/<schema>/boxes/<name>.yaml        kind: Th2Box
//! <root>/<schema>/core/<name>.yaml         kind: Th2CoreBox | Th2Estore | Th2Mstore
//! <root>/<schema>/links/<name>.yaml        kind: Th2Link
//! <root>/<schema>/dictionaries/<name>.yaml kind: Th2Dictionary
//! ```

pub mod config;
pub mod error;
pub mod file;
pub mod mock;
pub mod service;
pub mod watcher;

pub use config::RepositoryOptions;
pub use error::{RepoError, Result};
pub use file::FileRepository;
pub use mock::{MockRepository, RepoOperationCounts};
pub use service::RepositoryService;
pub use watcher::{RepositoryWatcher, schema_for_path};
