use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CourseSnapshot, Model};

/// Lifecycle status of an [`Instance`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Active => "active",
            InstanceStatus::Paused => "paused",
            InstanceStatus::Completed => "completed",
            InstanceStatus::Abandoned => "abandoned",
        }
    }

    /// Terminal states are kept for history and never left.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InstanceStatus::Completed | InstanceStatus::Abandoned)
    }

    /// Transitions driven by the caller. Completion is driven by progress only
    /// and is not part of this table.
    pub fn can_transition_to(&self, next: InstanceStatus) -> bool {
        matches!(
            (self, next),
            (InstanceStatus::Active, InstanceStatus::Paused)
                | (InstanceStatus::Paused, InstanceStatus::Active)
                | (InstanceStatus::Active, InstanceStatus::Abandoned)
                | (InstanceStatus::Paused, InstanceStatus::Abandoned)
        )
    }

    /// Whether task submissions are accepted in this state.
    pub fn accepts_submissions(&self) -> bool {
        matches!(self, InstanceStatus::Active | InstanceStatus::Completed)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user's binding to one catalog course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    pub id: String,
    pub user_id: String,
    pub context_id: String,
    pub course_id: String,
    pub title: String,
    pub status: InstanceStatus,
    pub progress_percent: u32,
    pub progress_label: String,
    pub enrolled_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for Instance {
    const COLLECTION: &'static str = "instances";

    fn id(&self) -> &str {
        &self.id
    }
}

/// What a progress update did to the cached summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    /// Percent stayed the same or went up.
    Advanced,
    /// Upstream reported a lower percent; stored as-is.
    Regressed { from: u32, to: u32 },
    /// Lower percent on a completed instance; cached percent left unchanged.
    HeldAtCompletion { reported: u32 },
}

impl Instance {
    /// A fresh `active` instance whose progress mirrors `snapshot`.
    pub fn enroll(
        user_id: &str,
        context_id: &str,
        course_id: &str,
        snapshot: &CourseSnapshot,
        now: DateTime<Utc>,
    ) -> Self {
        Instance {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            context_id: context_id.to_string(),
            course_id: course_id.to_string(),
            title: snapshot.name.clone(),
            status: InstanceStatus::Active,
            progress_percent: snapshot.progress_percent,
            progress_label: snapshot.progress_label.clone(),
            enrolled_at: now,
            completed_at: None,
            last_synced_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == InstanceStatus::Active
    }

    /// Copy the post-submission course progress into the cached summary.
    ///
    /// Reaching 100% completes the instance once; a completed instance never
    /// reverts and keeps its cached percent at or above 100.
    pub fn apply_progress(&mut self, snapshot: &CourseSnapshot, now: DateTime<Utc>) -> ProgressChange {
        let reported = snapshot.progress_percent;
        let previous = self.progress_percent;

        let change = if self.status == InstanceStatus::Completed && reported < 100 {
            ProgressChange::HeldAtCompletion { reported }
        } else {
            self.progress_percent = reported;
            self.progress_label = snapshot.progress_label.clone();
            if reported < previous {
                ProgressChange::Regressed {
                    from: previous,
                    to: reported,
                }
            } else {
                ProgressChange::Advanced
            }
        };

        if reported >= 100 && self.status != InstanceStatus::Completed {
            self.status = InstanceStatus::Completed;
            self.completed_at = Some(now);
        }

        self.last_synced_at = Some(now);
        self.updated_at = now;
        change
    }

    /// Apply a caller-driven status transition. Returns `false` (and leaves the
    /// instance untouched) if the transition is not allowed.
    pub fn transition(&mut self, next: InstanceStatus, now: DateTime<Utc>) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        self.updated_at = now;
        true
    }
}
