//! XP awards derived from a post-submission course snapshot.

use serde::{Deserialize, Serialize};

use crate::model::CourseSnapshot;

/// Fixed XP constants. Awards are independent and additive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardPolicy {
    /// Every successful submission
    pub task_xp: u32,
    /// The submitted task's module reports 100%
    pub module_xp: u32,
    /// The course reports 100%
    pub course_xp: u32,
}

impl Default for RewardPolicy {
    fn default() -> Self {
        Self {
            task_xp: 10,
            module_xp: 50,
            course_xp: 200,
        }
    }
}

impl RewardPolicy {
    /// XP for a submission in `module_id`, given the snapshot returned by it.
    ///
    /// Saturates at `u32::MAX` for oversized configured awards.
    pub fn compute_xp(&self, snapshot: &CourseSnapshot, module_id: &str) -> u32 {
        let mut xp = self.task_xp;
        if snapshot
            .module(module_id)
            .is_some_and(|module| module.is_complete())
        {
            xp = xp.saturating_add(self.module_xp);
        }
        if snapshot.is_complete() {
            xp = xp.saturating_add(self.course_xp);
        }
        xp
    }
}
