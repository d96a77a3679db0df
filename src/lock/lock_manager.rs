use super::LockError;

/// Hands out mutual exclusion per key.
///
/// The guard returned by [`acquire`](LockManager::acquire) holds the key until
/// it is dropped. A multi-process deployment would back this with database
/// advisory locks keyed the same way.
pub trait LockManager: Send + Sync {
    type Guard<'a>
    where
        Self: 'a;

    /// Block until `key` is free, then hold it.
    fn acquire(&self, key: &str) -> Result<Self::Guard<'_>, LockError>;
}
