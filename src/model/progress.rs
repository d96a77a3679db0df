use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Model;

/// Immutable audit record of one task-state transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub id: String,
    pub instance_id: String,
    pub module_id: String,
    pub task_id: String,
    pub prior_state: String,
    pub new_state: String,
    pub progress_percent: u32,
    pub created_at: DateTime<Utc>,
}

impl Model for ProgressEvent {
    const COLLECTION: &'static str = "progress_events";

    fn id(&self) -> &str {
        &self.id
    }
}

impl ProgressEvent {
    pub fn new(
        instance_id: &str,
        module_id: &str,
        task_id: &str,
        prior_state: impl Into<String>,
        new_state: impl Into<String>,
        progress_percent: u32,
        created_at: DateTime<Utc>,
    ) -> Self {
        ProgressEvent {
            id: Uuid::new_v4().to_string(),
            instance_id: instance_id.to_string(),
            module_id: module_id.to_string(),
            task_id: task_id.to_string(),
            prior_state: prior_state.into(),
            new_state: new_state.into(),
            progress_percent,
            created_at,
        }
    }
}
