//! InMemoryStore - HashMap-backed store for testing and development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::model::{IdentityMapping, Instance, Model, ProgressEvent, Versioned};

use super::{InstanceStore, StoreError};

/// Internal stored representation of a row.
struct StoredRow {
    bytes: Vec<u8>,
    version: u64,
}

/// In-memory store backed by a HashMap of JSON-encoded rows plus an
/// append-only event log.
///
/// Row key is `"COLLECTION:id"`. Clone-friendly via Arc; clones share storage.
#[derive(Clone)]
pub struct InMemoryStore {
    rows: Arc<RwLock<HashMap<String, StoredRow>>>,
    events: Arc<RwLock<Vec<ProgressEvent>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            rows: Arc::new(RwLock::new(HashMap::new())),
            events: Arc::new(RwLock::new(Vec::new())),
        }
    }

    fn make_key(collection: &str, id: &str) -> String {
        format!("{}:{}", collection, id)
    }

    fn encode<M: Model>(model: &M) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(model).map_err(|e| StoreError::Serde(e.to_string()))
    }

    fn decode<M: Model>(bytes: &[u8]) -> Result<M, StoreError> {
        serde_json::from_slice(bytes).map_err(|e| StoreError::Serde(e.to_string()))
    }

    fn instances<'a>(
        rows: &'a HashMap<String, StoredRow>,
    ) -> impl Iterator<Item = Result<Versioned<Instance>, StoreError>> + 'a {
        let prefix = format!("{}:", Instance::COLLECTION);
        rows.iter()
            .filter(move |(key, _)| key.starts_with(&prefix))
            .map(|(_, stored)| {
                Self::decode::<Instance>(&stored.bytes).map(|data| Versioned {
                    data,
                    version: stored.version,
                })
            })
    }

    /// Id of another active instance of `instance.user_id`, if one exists.
    fn other_active(
        rows: &HashMap<String, StoredRow>,
        instance: &Instance,
    ) -> Result<Option<String>, StoreError> {
        for row in Self::instances(rows) {
            let row = row?;
            if row.data.user_id == instance.user_id
                && row.data.is_active()
                && row.data.id != instance.id
            {
                return Ok(Some(row.data.id));
            }
        }
        Ok(None)
    }
}

impl InstanceStore for InMemoryStore {
    fn get_context_id(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let key = Self::make_key(IdentityMapping::COLLECTION, user_id);
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        match rows.get(&key) {
            Some(stored) => {
                let mapping: IdentityMapping = Self::decode(&stored.bytes)?;
                Ok(Some(mapping.context_id))
            }
            None => Ok(None),
        }
    }

    fn put_context_id(&self, mapping: &IdentityMapping) -> Result<(), StoreError> {
        let key = Self::make_key(IdentityMapping::COLLECTION, mapping.id());
        let bytes = Self::encode(mapping)?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        if let Some(stored) = rows.get(&key) {
            let existing: IdentityMapping = Self::decode(&stored.bytes)?;
            if existing.context_id == mapping.context_id {
                return Ok(());
            }
            return Err(StoreError::MappingConflict {
                user_id: mapping.user_id.clone(),
            });
        }

        rows.insert(key, StoredRow { bytes, version: 1 });
        Ok(())
    }

    fn insert_instance(&self, instance: &Instance) -> Result<Versioned<Instance>, StoreError> {
        let key = Self::make_key(Instance::COLLECTION, instance.id());
        let bytes = Self::encode(instance)?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        if rows.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                collection: Instance::COLLECTION.to_string(),
                id: instance.id.clone(),
            });
        }

        if instance.is_active() {
            if let Some(existing) = Self::other_active(&rows, instance)? {
                return Err(StoreError::ActiveInstanceExists {
                    user_id: instance.user_id.clone(),
                    instance_id: existing,
                });
            }
        }

        rows.insert(key, StoredRow { bytes, version: 1 });

        Ok(Versioned {
            data: instance.clone(),
            version: 1,
        })
    }

    fn get_instance(&self, id: &str) -> Result<Option<Versioned<Instance>>, StoreError> {
        let key = Self::make_key(Instance::COLLECTION, id);
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        match rows.get(&key) {
            Some(stored) => Ok(Some(Versioned {
                data: Self::decode(&stored.bytes)?,
                version: stored.version,
            })),
            None => Ok(None),
        }
    }

    fn update_instance(
        &self,
        instance: &Instance,
        expected_version: u64,
    ) -> Result<Versioned<Instance>, StoreError> {
        let key = Self::make_key(Instance::COLLECTION, instance.id());
        let bytes = Self::encode(instance)?;
        let mut rows = self
            .rows
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;

        let actual_version = rows
            .get(&key)
            .map(|s| s.version)
            .ok_or_else(|| StoreError::NotFound {
                collection: Instance::COLLECTION.to_string(),
                id: instance.id.clone(),
            })?;

        if actual_version != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                collection: Instance::COLLECTION.to_string(),
                id: instance.id.clone(),
                expected: expected_version,
                actual: actual_version,
            });
        }

        if instance.is_active() {
            if let Some(existing) = Self::other_active(&rows, instance)? {
                return Err(StoreError::ActiveInstanceExists {
                    user_id: instance.user_id.clone(),
                    instance_id: existing,
                });
            }
        }

        let new_version = actual_version + 1;
        rows.insert(
            key,
            StoredRow {
                bytes,
                version: new_version,
            },
        );

        Ok(Versioned {
            data: instance.clone(),
            version: new_version,
        })
    }

    fn get_active_instance(
        &self,
        user_id: &str,
    ) -> Result<Option<Versioned<Instance>>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        for row in Self::instances(&rows) {
            let row = row?;
            if row.data.user_id == user_id && row.data.is_active() {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn list_instances(&self, user_id: &str) -> Result<Vec<Instance>, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;

        let mut results = Vec::new();
        for row in Self::instances(&rows) {
            let row = row?;
            if row.data.user_id == user_id {
                results.push(row.data);
            }
        }
        results.sort_by(|a, b| b.enrolled_at.cmp(&a.enrolled_at));
        Ok(results)
    }

    fn append_progress(&self, event: &ProgressEvent) -> Result<(), StoreError> {
        let mut events = self
            .events
            .write()
            .map_err(|_| StoreError::LockPoisoned("event write"))?;

        if events.iter().any(|e| e.id == event.id) {
            return Err(StoreError::AlreadyExists {
                collection: ProgressEvent::COLLECTION.to_string(),
                id: event.id.clone(),
            });
        }

        events.push(event.clone());
        Ok(())
    }

    fn list_progress(&self, instance_id: &str) -> Result<Vec<ProgressEvent>, StoreError> {
        let events = self
            .events
            .read()
            .map_err(|_| StoreError::LockPoisoned("event read"))?;

        let mut results: Vec<ProgressEvent> = events
            .iter()
            .filter(|e| e.instance_id == instance_id)
            .cloned()
            .collect();
        // stable: append order is kept for equal timestamps
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(results)
    }
}
