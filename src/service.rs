//! Lernreise - the produced interface of the orchestration service.
//!
//! `Lernreise<S, C, G>` is built once from its collaborators (store, catalog,
//! registry) and never swaps them afterwards. Every operation takes the
//! already-authenticated [`Caller`] and returns a result or a typed
//! [`ServiceError`].
//!
//! ## Example
//!
//! ```ignore
//! use lernreise::{Caller, HttpCatalogClient, HttpRegistryClient, InMemoryStore, Lernreise};
//!
//! let service = Lernreise::new(
//!     InMemoryStore::new(),
//!     HttpCatalogClient::new(&config.catalog)?,
//!     HttpRegistryClient::new(&config.registry)?,
//!     config.rewards,
//! );
//!
//! let caller = Caller::new("user-42").with_profile("ext-42", "Anna Schmidt", "anna@example.org");
//! let enrollment = service.select(&caller, "course1")?;
//! let result = service.submit_task(&caller, &enrollment.instance.id, "mod1", "task1")?;
//! println!("+{} XP", result.xp_awarded);
//! ```

use std::sync::Arc;

use serde::Serialize;

use crate::enrollment::EnrollmentManager;
use crate::error::ServiceError;
use crate::gateway::{CatalogGateway, RegistryGateway};
use crate::identity::{Caller, IdentityResolver};
use crate::lock::InMemoryLockManager;
use crate::model::{CourseSnapshot, CourseSummary, Instance, ProgressEvent};
use crate::progress::{ProgressTracker, TaskSubmission};
use crate::reward::RewardPolicy;
use crate::store::InstanceStore;

/// Result of selecting a course.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Enrollment {
    pub instance: Instance,
    pub course: CourseSnapshot,
}

/// The orchestration service.
pub struct Lernreise<S, C, G> {
    catalog: Arc<C>,
    identity: IdentityResolver<S, G>,
    enrollment: EnrollmentManager<S, C>,
    progress: ProgressTracker<S, C>,
}

impl<S, C, G> Lernreise<S, C, G>
where
    S: InstanceStore,
    C: CatalogGateway,
    G: RegistryGateway,
{
    /// Wire the service from fully-resolved collaborators.
    pub fn new(store: S, catalog: C, registry: G, rewards: RewardPolicy) -> Self {
        let store = Arc::new(store);
        let catalog = Arc::new(catalog);
        let registry = Arc::new(registry);
        let locks = Arc::new(InMemoryLockManager::new());

        Self {
            identity: IdentityResolver::new(store.clone(), registry, locks.clone()),
            enrollment: EnrollmentManager::new(store.clone(), catalog.clone(), locks.clone()),
            progress: ProgressTracker::new(store, catalog.clone(), locks, rewards),
            catalog,
        }
    }

    pub fn rewards(&self) -> &RewardPolicy {
        self.progress.rewards()
    }

    /// The caller's catalog context, registering them on first use.
    pub fn resolve_context(&self, caller: &Caller) -> Result<String, ServiceError> {
        self.identity.resolve_context(caller)
    }

    /// Courses available to the caller.
    pub fn list_catalog(&self, caller: &Caller) -> Result<Vec<CourseSummary>, ServiceError> {
        let context_id = self.resolve_context(caller)?;
        Ok(self.catalog.list_courses(&context_id)?)
    }

    /// Current snapshot of one course for the caller.
    pub fn get_catalog_detail(
        &self,
        caller: &Caller,
        course_id: &str,
    ) -> Result<CourseSnapshot, ServiceError> {
        if course_id.trim().is_empty() {
            return Err(ServiceError::Validation("missing course id".into()));
        }
        let context_id = self.resolve_context(caller)?;
        Ok(self.catalog.get_course_data(&context_id, course_id)?)
    }

    /// Enroll the caller in `course_id`.
    pub fn select(&self, caller: &Caller, course_id: &str) -> Result<Enrollment, ServiceError> {
        let context_id = self.resolve_context(caller)?;
        let (instance, course) = self
            .enrollment
            .select(&caller.user_id, &context_id, course_id)?;
        Ok(Enrollment { instance, course })
    }

    pub fn get_active(&self, caller: &Caller) -> Result<Option<Instance>, ServiceError> {
        caller.validate()?;
        self.enrollment.get_active(&caller.user_id)
    }

    pub fn list_instances(&self, caller: &Caller) -> Result<Vec<Instance>, ServiceError> {
        caller.validate()?;
        self.enrollment.list(&caller.user_id)
    }

    /// An instance owned by the caller. Other users' instances are reported
    /// as not found.
    pub fn get_instance(&self, caller: &Caller, instance_id: &str) -> Result<Instance, ServiceError> {
        caller.validate()?;
        let instance = self.enrollment.get(instance_id)?.data;
        if instance.user_id != caller.user_id {
            return Err(ServiceError::NotFound(format!("instance {}", instance_id)));
        }
        Ok(instance)
    }

    pub fn pause(&self, caller: &Caller, instance_id: &str) -> Result<Instance, ServiceError> {
        self.owned_for_write(caller, instance_id)?;
        self.enrollment.pause(instance_id)
    }

    pub fn resume(&self, caller: &Caller, instance_id: &str) -> Result<Instance, ServiceError> {
        self.owned_for_write(caller, instance_id)?;
        self.enrollment.resume(instance_id)
    }

    pub fn abandon(&self, caller: &Caller, instance_id: &str) -> Result<Instance, ServiceError> {
        self.owned_for_write(caller, instance_id)?;
        self.enrollment.abandon(instance_id)
    }

    /// Submit a task of the caller's instance and award XP.
    pub fn submit_task(
        &self,
        caller: &Caller,
        instance_id: &str,
        module_id: &str,
        task_id: &str,
    ) -> Result<TaskSubmission, ServiceError> {
        let instance = self.owned_for_write(caller, instance_id)?;
        self.progress.submit_task(&instance, module_id, task_id)
    }

    /// Audit trail of one of the caller's instances, oldest first.
    pub fn list_progress(
        &self,
        caller: &Caller,
        instance_id: &str,
    ) -> Result<Vec<ProgressEvent>, ServiceError> {
        let instance = self.get_instance(caller, instance_id)?;
        self.progress.list_progress(&instance.id)
    }

    /// Whether the catalog is reachable.
    pub fn health(&self) -> Result<(), ServiceError> {
        Ok(self.catalog.ping()?)
    }

    /// Explicit ownership check for mutations: unknown ids are not found,
    /// foreign ids are denied.
    fn owned_for_write(&self, caller: &Caller, instance_id: &str) -> Result<Instance, ServiceError> {
        caller.validate()?;
        if instance_id.trim().is_empty() {
            return Err(ServiceError::Validation("missing instance id".into()));
        }
        let instance = self.enrollment.get(instance_id)?.data;
        if instance.user_id != caller.user_id {
            return Err(ServiceError::AccessDenied(format!(
                "instance {} belongs to another user",
                instance_id
            )));
        }
        Ok(instance)
    }
}
