//! Keyed locks used to serialize operations on one user or one instance.
//!
//! The service asks its `LockManager` for a key such as `instance:<id>` and
//! holds the returned guard for the whole operation. Dropping the guard
//! releases the key on every exit path.

mod error;
mod in_memory;
mod lock_manager;

pub use error::LockError;
pub use in_memory::{InMemoryLockManager, LockGuard};
pub use lock_manager::LockManager;
