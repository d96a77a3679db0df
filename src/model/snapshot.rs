//! Course data as reported by the upstream catalog.

use serde::{Deserialize, Serialize};

/// Task state assumed when a task cannot be located or read.
pub const DEFAULT_TASK_STATE: &str = "open";

/// One entry of a catalog course listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// The state of a course (modules, tasks, progress) at one point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSnapshot {
    pub id: String,
    pub name: String,
    pub progress_percent: u32,
    #[serde(default)]
    pub progress_label: String,
    #[serde(default)]
    pub modules: Vec<ModuleSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleSnapshot {
    pub id: String,
    pub name: String,
    pub progress_percent: u32,
    #[serde(default)]
    pub tasks: Vec<TaskSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    pub id: String,
    pub state: String,
    #[serde(default)]
    pub name: String,
}

impl CourseSnapshot {
    /// Find a module by id, scanning in upstream order.
    pub fn module(&self, module_id: &str) -> Option<&ModuleSnapshot> {
        self.modules.iter().find(|m| m.id == module_id)
    }

    /// State of `(module_id, task_id)`, or [`DEFAULT_TASK_STATE`] when either
    /// level has no match.
    pub fn task_state(&self, module_id: &str, task_id: &str) -> &str {
        self.module(module_id)
            .and_then(|m| m.task(task_id))
            .map(|t| t.state.as_str())
            .unwrap_or(DEFAULT_TASK_STATE)
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent >= 100
    }
}

impl ModuleSnapshot {
    pub fn task(&self, task_id: &str) -> Option<&TaskSnapshot> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    pub fn is_complete(&self) -> bool {
        self.progress_percent >= 100
    }
}
