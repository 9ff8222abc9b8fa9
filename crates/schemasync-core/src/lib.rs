//! schemasync Core - Core types and utilities for schema synchronization
//!
//! This crate provides the foundational types used throughout schemasync:
//! - `ResourceType`: The closed table of resource kinds and their cluster attributes
//! - `ResourceEntry`: One desired object as declared in a schema branch
//! - `RepositorySnapshot`: A schema's resources and settings at its branch tip
//! - `hash`: Content fingerprints used for change detection
//! - `canonical`: Leaf-value canonicalization applied before hashing and submission
//! - `events`: Repository update events and the router that fans them out

pub mod canonical;
pub mod error;
pub mod events;
pub mod hash;
pub mod resource;
pub mod snapshot;

pub use canonical::{canonicalize, is_canonical};
pub use error::{CoreError, Result};
pub use events::{EventRouter, EventSubscription, RepositoryUpdateEvent, is_external};
pub use hash::{digest, spec_hash};
pub use resource::{
    API_GROUP, API_VERSION, PropagationMode, RepositorySettings, ResourceDocument, ResourceEntry,
    ResourceType, api_version,
};
pub use snapshot::{DesiredState, RepositorySnapshot, empty_desired_state};
