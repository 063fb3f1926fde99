// Human work items — the offer/claim/start/complete lifecycle
//
//! A work item is the unit a human actor sees, claims, and acts on —
//! unlike an automated task, which fires immediately once its join is
//! satisfied. The lifecycle follows a "status enum + timestamped
//! transition" shape.

use super::ids::{GroupName, TaskInstanceRef, UserId, WorkItemId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkItemStatus {
    /// Created but not yet shown to anyone (no matching audience yet,
    /// or created ahead of an `onEnabled` offer).
    Created,
    /// Visible to its audience; anyone satisfying `claimPolicy` may
    /// claim it.
    Offered,
    /// Claimed by exactly one user; not yet started.
    Claimed,
    /// In progress — the claimant is actively working it.
    Started,
    Completed,
    Canceled,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: WorkItemId,
    pub task: TaskInstanceRef,
    pub status: WorkItemStatus,
    /// The user this item is currently claimed by, if any.
    pub claimed_by: Option<UserId>,
    pub offered_group: Option<GroupName>,
    pub created_at: DateTime<Utc>,
    pub offered_at: Option<DateTime<Utc>>,
    pub claimed_at: Option<DateTime<Utc>>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Set once the work item completes; becomes the task instance's
    /// output payload.
    pub result: Option<Value>,
}

impl WorkItem {
    pub fn new(id: WorkItemId, task: TaskInstanceRef) -> Self {
        WorkItem {
            id,
            task,
            status: WorkItemStatus::Created,
            claimed_by: None,
            offered_group: None,
            created_at: Utc::now(),
            offered_at: None,
            claimed_at: None,
            started_at: None,
            completed_at: None,
            result: None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self.status,
            WorkItemStatus::Created
                | WorkItemStatus::Offered
                | WorkItemStatus::Claimed
                | WorkItemStatus::Started
        )
    }

    pub fn offer(&mut self, at: DateTime<Utc>, group: Option<GroupName>) {
        self.status = WorkItemStatus::Offered;
        self.offered_at = Some(at);
        self.offered_group = group;
    }

    pub fn claim(&mut self, user: UserId, at: DateTime<Utc>) {
        self.claimed_by = Some(user);
        self.claimed_at = Some(at);
        self.status = WorkItemStatus::Claimed;
    }

    pub fn start(&mut self, at: DateTime<Utc>) {
        self.started_at = Some(at);
        self.status = WorkItemStatus::Started;
    }

    pub fn complete(&mut self, result: Value, at: DateTime<Utc>) {
        self.result = Some(result);
        self.completed_at = Some(at);
        self.status = WorkItemStatus::Completed;
    }
}
