use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};

use super::{LockError, LockManager};

/// One key's state: whether it is held, and a condvar for waiters.
#[derive(Default)]
struct KeySlot {
    held: Mutex<bool>,
    released: Condvar,
}

/// In-process [`LockManager`] over a table of per-key slots.
///
/// A slot exists only while some guard holds or waits for its key. Every
/// clone and drop of a slot `Arc` happens under the table mutex, so the
/// releasing guard can tell exactly when it was the last user.
#[derive(Default)]
pub struct InMemoryLockManager {
    slots: Mutex<HashMap<String, Arc<KeySlot>>>,
}

impl InMemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &str) -> Result<Arc<KeySlot>, LockError> {
        let mut slots = self.slots.lock().map_err(|_| LockError::poisoned(key))?;
        Ok(slots.entry(key.to_string()).or_default().clone())
    }

    fn release(&self, key: &str, slot: Arc<KeySlot>) -> Result<(), LockError> {
        {
            let mut held = slot.held.lock().map_err(|_| LockError::poisoned(key))?;
            *held = false;
        }
        slot.released.notify_one();

        let mut slots = self.slots.lock().map_err(|_| LockError::poisoned(key))?;
        drop(slot);
        if slots.get(key).is_some_and(|s| Arc::strong_count(s) == 1) {
            slots.remove(key);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn key_count(&self) -> usize {
        self.slots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

impl LockManager for InMemoryLockManager {
    type Guard<'a> = LockGuard<'a>;

    fn acquire(&self, key: &str) -> Result<LockGuard<'_>, LockError> {
        let slot = self.slot(key)?;
        {
            let mut held = slot.held.lock().map_err(|_| LockError::poisoned(key))?;
            while *held {
                held = slot
                    .released
                    .wait(held)
                    .map_err(|_| LockError::poisoned(key))?;
            }
            *held = true;
        }
        Ok(LockGuard {
            manager: self,
            key: key.to_string(),
            slot: Some(slot),
        })
    }
}

/// Holds a key of an [`InMemoryLockManager`] until dropped.
#[must_use = "the key is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    manager: &'a InMemoryLockManager,
    key: String,
    slot: Option<Arc<KeySlot>>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            if let Err(e) = self.manager.release(&self.key, slot) {
                tracing::error!(key = %self.key, error = %e, "failed to release lock");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn released_keys_leave_no_entries() {
        let manager = InMemoryLockManager::new();
        for i in 0..10_000 {
            let _guard = manager.acquire(&format!("instance:{i}")).unwrap();
        }
        assert_eq!(manager.key_count(), 0);
    }

    #[test]
    fn held_key_keeps_its_entry() {
        let manager = InMemoryLockManager::new();
        let guard = manager.acquire("user:u1").unwrap();
        let other = manager.acquire("user:u2").unwrap();
        assert_eq!(manager.key_count(), 2);

        drop(other);
        assert_eq!(manager.key_count(), 1);
        drop(guard);
        assert_eq!(manager.key_count(), 0);
    }

    #[test]
    fn key_is_reacquirable_after_release() {
        let manager = InMemoryLockManager::new();
        drop(manager.acquire("user:u1").unwrap());
        let _again = manager.acquire("user:u1").unwrap();
        assert_eq!(manager.key_count(), 1);
    }

    #[test]
    fn guard_serializes_critical_sections() {
        let manager = Arc::new(InMemoryLockManager::new());
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let _guard = manager.acquire("instance:1").unwrap();
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    inside.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(manager.key_count(), 0);
    }

    #[test]
    fn different_keys_do_not_block() {
        let manager = InMemoryLockManager::new();
        let _a = manager.acquire("instance:1").unwrap();
        let _b = manager.acquire("instance:2").unwrap();
    }
}
