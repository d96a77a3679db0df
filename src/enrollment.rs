//! Enrollment: creating and managing a user's course instances.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::gateway::CatalogGateway;
use crate::lock::{InMemoryLockManager, LockManager};
use crate::model::{CourseSnapshot, Instance, InstanceStatus, Versioned};
use crate::store::InstanceStore;

pub(crate) fn enrollment_key(user_id: &str) -> String {
    format!("enrollment:{}", user_id)
}

pub(crate) fn instance_key(instance_id: &str) -> String {
    format!("instance:{}", instance_id)
}

/// Creates, reads and transitions instances. Enforces the single active
/// instance per user.
pub struct EnrollmentManager<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    locks: Arc<InMemoryLockManager>,
}

impl<S: InstanceStore, C: CatalogGateway> EnrollmentManager<S, C> {
    pub fn new(store: Arc<S>, catalog: Arc<C>, locks: Arc<InMemoryLockManager>) -> Self {
        Self {
            store,
            catalog,
            locks,
        }
    }

    /// Bind the user to `course_id`.
    ///
    /// Fails with a conflict if the user already has an active instance. No
    /// instance is stored unless both the catalog fetch and the insert succeed.
    /// The catalog is read before the enrollment lock is taken; only the
    /// recheck and the insert run under it.
    pub fn select(
        &self,
        user_id: &str,
        context_id: &str,
        course_id: &str,
    ) -> Result<(Instance, CourseSnapshot), ServiceError> {
        if course_id.trim().is_empty() {
            return Err(ServiceError::Validation("missing course id".into()));
        }

        self.ensure_no_active(user_id, course_id)?;
        let snapshot = self.catalog.get_course_data(context_id, course_id)?;

        let _guard = self.locks.acquire(&enrollment_key(user_id))?;
        // a concurrent select may have won while we were fetching
        self.ensure_no_active(user_id, course_id)?;

        let instance = Instance::enroll(user_id, context_id, course_id, &snapshot, Utc::now());
        self.store.insert_instance(&instance)?;

        info!(
            user_id,
            instance_id = %instance.id,
            course_id,
            progress = instance.progress_percent,
            "enrolled in course"
        );
        Ok((instance, snapshot))
    }

    fn ensure_no_active(&self, user_id: &str, course_id: &str) -> Result<(), ServiceError> {
        match self.store.get_active_instance(user_id)? {
            Some(active) => {
                warn!(user_id, instance_id = %active.data.id, course_id, "select rejected: active instance exists");
                Err(ServiceError::ActiveInstanceExists {
                    instance_id: active.data.id,
                })
            }
            None => Ok(()),
        }
    }

    /// The user's active instance, if any.
    pub fn get_active(&self, user_id: &str) -> Result<Option<Instance>, ServiceError> {
        Ok(self.store.get_active_instance(user_id)?.map(|v| v.data))
    }

    /// All of the user's instances, newest enrollment first.
    pub fn list(&self, user_id: &str) -> Result<Vec<Instance>, ServiceError> {
        Ok(self.store.list_instances(user_id)?)
    }

    /// An instance by id.
    pub fn get(&self, instance_id: &str) -> Result<Versioned<Instance>, ServiceError> {
        self.store
            .get_instance(instance_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("instance {}", instance_id)))
    }

    /// `active → paused`.
    pub fn pause(&self, instance_id: &str) -> Result<Instance, ServiceError> {
        self.transition(instance_id, InstanceStatus::Paused)
    }

    /// `paused → active`; a conflict if another instance became active meanwhile.
    pub fn resume(&self, instance_id: &str) -> Result<Instance, ServiceError> {
        self.transition(instance_id, InstanceStatus::Active)
    }

    /// `active | paused → abandoned`. Terminal.
    pub fn abandon(&self, instance_id: &str) -> Result<Instance, ServiceError> {
        self.transition(instance_id, InstanceStatus::Abandoned)
    }

    fn transition(&self, instance_id: &str, next: InstanceStatus) -> Result<Instance, ServiceError> {
        let current = self.get(instance_id)?;

        // enrollment lock is always taken before an instance lock
        let _user_guard = match next {
            InstanceStatus::Active => Some(self.locks.acquire(&enrollment_key(&current.data.user_id))?),
            _ => None,
        };
        let _guard = self.locks.acquire(&instance_key(instance_id))?;

        let current = self.get(instance_id)?;
        let mut instance = current.data.clone();

        if next == InstanceStatus::Active {
            if let Some(active) = self.store.get_active_instance(&instance.user_id)? {
                if active.data.id != instance.id {
                    return Err(ServiceError::ActiveInstanceExists {
                        instance_id: active.data.id,
                    });
                }
            }
        }

        let from = instance.status;
        if !instance.transition(next, Utc::now()) {
            return Err(ServiceError::Validation(format!(
                "instance {} cannot go from {} to {}",
                instance_id, from, next
            )));
        }

        self.store.update_instance(&instance, current.version)?;
        info!(instance_id, user_id = %instance.user_id, from = %from, to = %next, "instance status changed");
        Ok(instance)
    }
}
