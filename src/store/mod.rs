//! Persistence contract for instances, progress events and identity mappings.
//!
//! The service enforces every invariant itself; a store only has to persist
//! rows, assign versions, and refuse writes that would break the uniqueness
//! rules a relational schema would carry as constraints (one mapping per user,
//! one `active` instance per user).

mod in_memory;

use thiserror::Error;

use crate::model::{IdentityMapping, Instance, ProgressEvent, Versioned};

pub use in_memory::InMemoryStore;

/// Error type for store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The underlying lock was poisoned.
    #[error("store lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// Serialization/deserialization error.
    #[error("store serialization error: {0}")]
    Serde(String),
    /// Insert of a row whose id is already taken.
    #[error("{collection}:{id} already exists")]
    AlreadyExists { collection: String, id: String },
    /// Optimistic concurrency conflict.
    #[error("concurrency conflict on {collection}:{id} (expected version {expected}, actual {actual})")]
    ConcurrencyConflict {
        collection: String,
        id: String,
        expected: u64,
        actual: u64,
    },
    /// Update of a row that does not exist.
    #[error("{collection}:{id} not found")]
    NotFound { collection: String, id: String },
    /// A second `active` instance for the same user.
    #[error("user {user_id} already has an active instance ({instance_id})")]
    ActiveInstanceExists { user_id: String, instance_id: String },
    /// An identity mapping is already set to a different context.
    #[error("identity mapping for user {user_id} is already set")]
    MappingConflict { user_id: String },
    /// Any other storage-level failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Abstract storage for the service's records.
pub trait InstanceStore: Send + Sync {
    /// Cached context id for a user, if any.
    fn get_context_id(&self, user_id: &str) -> Result<Option<String>, StoreError>;

    /// Persist a mapping. Writing the same context id again is a no-op; a
    /// different one fails with `MappingConflict`.
    fn put_context_id(&self, mapping: &IdentityMapping) -> Result<(), StoreError>;

    /// Insert a new instance at version 1.
    fn insert_instance(&self, instance: &Instance) -> Result<Versioned<Instance>, StoreError>;

    /// Get an instance by id.
    fn get_instance(&self, id: &str) -> Result<Option<Versioned<Instance>>, StoreError>;

    /// Update an existing instance if its stored version still equals
    /// `expected_version`.
    fn update_instance(
        &self,
        instance: &Instance,
        expected_version: u64,
    ) -> Result<Versioned<Instance>, StoreError>;

    /// The user's `active` instance, if any.
    fn get_active_instance(&self, user_id: &str)
        -> Result<Option<Versioned<Instance>>, StoreError>;

    /// All instances of a user, newest enrollment first.
    fn list_instances(&self, user_id: &str) -> Result<Vec<Instance>, StoreError>;

    /// Append a progress event. Events are never updated or deleted.
    fn append_progress(&self, event: &ProgressEvent) -> Result<(), StoreError>;

    /// Events of one instance ordered by creation time (append order on ties).
    fn list_progress(&self, instance_id: &str) -> Result<Vec<ProgressEvent>, StoreError>;
}
