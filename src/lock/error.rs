use thiserror::Error;

/// Error type for keyed locks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    /// A thread panicked while holding the lock table or the lock for `key`.
    #[error("lock for {key} poisoned")]
    Poisoned { key: String },
}

impl LockError {
    pub(crate) fn poisoned(key: &str) -> Self {
        LockError::Poisoned {
            key: key.to_string(),
        }
    }
}
