// Work-item lifecycle — offer/claim/start/complete/cancel transitions
//
//! Pure state-machine checks over a `WorkItem`, no I/O:
//! `engine::scheduler` owns persistence and auditing around each call
//! here. A "status enum + timestamped setter, guarded by a
//! `WrongState`-shaped error" convention, generalized across the work
//! item's six statuses.

use crate::error::{Result, WorkflowError};
use crate::models::ids::{GroupName, UserId};
use crate::models::work_item::{WorkItem, WorkItemStatus};
use chrono::{DateTime, Utc};
use serde_json::Value;

fn wrong_state(expected: WorkItemStatus, found: WorkItemStatus) -> WorkflowError {
    WorkflowError::WrongState {
        expected: format!("{:?}", expected),
        found: format!("{:?}", found),
    }
}

pub fn offer(item: &mut WorkItem, group: Option<GroupName>, now: DateTime<Utc>) -> Result<()> {
    if item.status != WorkItemStatus::Created {
        return Err(wrong_state(WorkItemStatus::Created, item.status));
    }
    item.offer(now, group);
    Ok(())
}

pub fn claim(item: &mut WorkItem, user: UserId, now: DateTime<Utc>) -> Result<()> {
    if item.status != WorkItemStatus::Offered {
        return Err(wrong_state(WorkItemStatus::Offered, item.status));
    }
    item.claim(user, now);
    Ok(())
}

pub fn start(item: &mut WorkItem, now: DateTime<Utc>) -> Result<()> {
    if item.status != WorkItemStatus::Claimed {
        return Err(wrong_state(WorkItemStatus::Claimed, item.status));
    }
    item.start(now);
    Ok(())
}

pub fn complete(item: &mut WorkItem, result: Value, now: DateTime<Utc>) -> Result<()> {
    if item.status != WorkItemStatus::Started {
        return Err(wrong_state(WorkItemStatus::Started, item.status));
    }
    item.complete(result, now);
    Ok(())
}

pub fn cancel(item: &mut WorkItem) -> Result<()> {
    if !item.is_open() {
        return Err(wrong_state(WorkItemStatus::Offered, item.status));
    }
    item.status = WorkItemStatus::Canceled;
    Ok(())
}

pub fn fail(item: &mut WorkItem) -> Result<()> {
    if !item.is_open() {
        return Err(wrong_state(WorkItemStatus::Started, item.status));
    }
    item.status = WorkItemStatus::Failed;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ids::{TaskInstanceRef, TaskName, WorkItemId, WorkflowId};

    fn sample() -> WorkItem {
        WorkItem::new(
            WorkItemId::new(),
            TaskInstanceRef {
                workflow_id: WorkflowId::new(),
                task_name: TaskName::from("approve"),
                generation: 0,
            },
        )
    }

    #[test]
    fn full_happy_path() {
        let mut item = sample();
        let now = Utc::now();
        offer(&mut item, None, now).unwrap();
        claim(&mut item, UserId::from("alice"), now).unwrap();
        start(&mut item, now).unwrap();
        complete(&mut item, serde_json::json!({"approved": true}), now).unwrap();
        assert_eq!(item.status, WorkItemStatus::Completed);
    }

    #[test]
    fn cannot_claim_before_offer() {
        let mut item = sample();
        let err = claim(&mut item, UserId::from("alice"), Utc::now());
        assert!(matches!(err, Err(WorkflowError::WrongState { .. })));
    }

    #[test]
    fn cannot_complete_twice() {
        let mut item = sample();
        let now = Utc::now();
        offer(&mut item, None, now).unwrap();
        claim(&mut item, UserId::from("alice"), now).unwrap();
        start(&mut item, now).unwrap();
        complete(&mut item, Value::Null, now).unwrap();
        let err = complete(&mut item, Value::Null, now);
        assert!(matches!(err, Err(WorkflowError::WrongState { .. })));
    }
}
