//! Models - the records the service persists and the course data it reads.
//!
//! `Instance`, `ProgressEvent` and `IdentityMapping` are stored through an
//! [`InstanceStore`](crate::store::InstanceStore); `CourseSnapshot` and
//! `CourseSummary` are upstream data and never persisted.
//!
//! ## Example
//!
//! ```ignore
//! use lernreise::{InMemoryStore, Instance, InstanceStore};
//!
//! let store = InMemoryStore::new();
//! let saved = store.insert_instance(&instance)?;
//! assert_eq!(saved.version, 1);
//! ```

mod identity;
mod instance;
mod progress;
mod snapshot;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be stored as rows.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// The collection name for this model type (e.g., "instances").
    /// Maps to a table in SQL, a key prefix in KV stores, etc.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;
}

/// A versioned wrapper around model data for optimistic concurrency control.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub data: T,
    pub version: u64,
}

pub use identity::IdentityMapping;
pub use instance::{Instance, InstanceStatus, ProgressChange};
pub use progress::ProgressEvent;
pub use snapshot::{CourseSnapshot, CourseSummary, ModuleSnapshot, TaskSnapshot, DEFAULT_TASK_STATE};
