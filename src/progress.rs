//! Progress tracking: task submission, audit events, cached summary, XP.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::enrollment::instance_key;
use crate::error::ServiceError;
use crate::gateway::CatalogGateway;
use crate::lock::{InMemoryLockManager, LockManager};
use crate::model::{
    CourseSnapshot, Instance, ProgressChange, ProgressEvent, DEFAULT_TASK_STATE,
};
use crate::reward::RewardPolicy;
use crate::store::InstanceStore;

/// Result of one successful task submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSubmission {
    /// Course snapshot returned by the submission
    pub course: CourseSnapshot,
    /// The appended audit record
    pub event: ProgressEvent,
    pub xp_awarded: u32,
    /// Instance as persisted after the submission
    pub instance: Instance,
}

/// Submits tasks upstream and records what changed.
///
/// The only writer of progress events. Submissions for one instance are
/// serialized, and the instance write is conditional on the version read
/// when the submission started.
pub struct ProgressTracker<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    locks: Arc<InMemoryLockManager>,
    rewards: RewardPolicy,
}

impl<S: InstanceStore, C: CatalogGateway> ProgressTracker<S, C> {
    pub fn new(
        store: Arc<S>,
        catalog: Arc<C>,
        locks: Arc<InMemoryLockManager>,
        rewards: RewardPolicy,
    ) -> Self {
        Self {
            store,
            catalog,
            locks,
            rewards,
        }
    }

    pub fn rewards(&self) -> &RewardPolicy {
        &self.rewards
    }

    /// Submit `(module_id, task_id)` for `instance`.
    ///
    /// A failed upstream submission leaves no trace. A store failure after a
    /// successful submission is reported even though upstream already changed.
    pub fn submit_task(
        &self,
        instance: &Instance,
        module_id: &str,
        task_id: &str,
    ) -> Result<TaskSubmission, ServiceError> {
        if module_id.trim().is_empty() || task_id.trim().is_empty() {
            return Err(ServiceError::Validation("missing module id or task id".into()));
        }

        // held across both catalog calls so submissions for one instance
        // cannot interleave between pre-fetch and update
        let _guard = self.locks.acquire(&instance_key(&instance.id))?;

        // the caller's copy may be stale; work from the stored row
        let current = self
            .store
            .get_instance(&instance.id)?
            .ok_or_else(|| ServiceError::NotFound(format!("instance {}", instance.id)))?;
        let stored = &current.data;

        if !stored.status.accepts_submissions() {
            return Err(ServiceError::Validation(format!(
                "instance {} is {} and does not accept submissions",
                stored.id, stored.status
            )));
        }

        let prior_state = self.prior_state(stored, module_id, task_id);

        let after = self
            .catalog
            .submit_task(&stored.context_id, &stored.course_id, module_id, task_id)?;
        let new_state = after.task_state(module_id, task_id).to_string();

        let now = Utc::now();
        let event = ProgressEvent::new(
            &stored.id,
            module_id,
            task_id,
            prior_state,
            new_state,
            after.progress_percent,
            now,
        );
        self.store.append_progress(&event)?;

        let mut updated = stored.clone();
        let was_completed = updated.completed_at.is_some();
        match updated.apply_progress(&after, now) {
            ProgressChange::Advanced => {}
            ProgressChange::Regressed { from, to } => {
                warn!(instance_id = %updated.id, from, to, "upstream progress regressed");
            }
            ProgressChange::HeldAtCompletion { reported } => {
                warn!(instance_id = %updated.id, reported, "completed instance reported below 100%");
            }
        }
        self.store.update_instance(&updated, current.version)?;

        if !was_completed && updated.completed_at.is_some() {
            info!(instance_id = %updated.id, user_id = %updated.user_id, course_id = %updated.course_id, "course completed");
        }

        let xp_awarded = self.rewards.compute_xp(&after, module_id);
        info!(
            instance_id = %updated.id,
            module_id,
            task_id,
            prior = %event.prior_state,
            new = %event.new_state,
            progress = after.progress_percent,
            xp = xp_awarded,
            "task submitted"
        );

        Ok(TaskSubmission {
            course: after,
            event,
            xp_awarded,
            instance: updated,
        })
    }

    /// Audit trail of an instance, oldest first.
    pub fn list_progress(&self, instance_id: &str) -> Result<Vec<ProgressEvent>, ServiceError> {
        Ok(self.store.list_progress(instance_id)?)
    }

    /// Best-effort read of the task's state before submission. Only feeds the
    /// audit record, so a failed read degrades to the default state.
    fn prior_state(&self, instance: &Instance, module_id: &str, task_id: &str) -> String {
        match self
            .catalog
            .get_course_data(&instance.context_id, &instance.course_id)
        {
            Ok(before) => before.task_state(module_id, task_id).to_string(),
            Err(e) => {
                warn!(
                    instance_id = %instance.id,
                    module_id,
                    task_id,
                    error = %e,
                    "pre-submission fetch failed, assuming default task state"
                );
                DEFAULT_TASK_STATE.to_string()
            }
        }
    }
}
