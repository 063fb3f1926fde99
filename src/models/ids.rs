// Identifiers for workflow engine entities
//
// Every identifier in the engine is a globally unique opaque string. We
// wrap `Uuid` for identifiers the engine itself mints (workflows, work
// items, spans, traces) and `String` for identifiers the host or a
// definition author supplies (task/condition names, scopes, users).
//
// Newtype IDs generalized to cover both cases rather than one macro per
// identifier kind.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                $name(u)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(WorkflowId);
uuid_id!(WorkItemId);
uuid_id!(TraceId);
uuid_id!(SpanId);

macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn new<S: Into<String>>(s: S) -> Self {
                $name(s.into())
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                $name(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                $name(s)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(TaskName);
string_id!(ConditionName);
string_id!(UserId);
string_id!(GroupName);
string_id!(RoleName);
string_id!(AggregateId);
/// Identifies a registered `PayloadCodec` in `models::schema::PayloadRegistry`.
string_id!(SchemaId);

/// `(workflowName, version)` — see  WorkflowDefinition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DefinitionRef {
    pub name: String,
    pub version: u32,
}

impl DefinitionRef {
    pub fn new<S: Into<String>>(name: S, version: u32) -> Self {
        DefinitionRef {
            name: name.into(),
            version,
        }
    }
}

impl fmt::Display for DefinitionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}

/// A task instance is addressed by its workflow, name, and generation —
/// re-enablement after cancellation bumps the generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskInstanceRef {
    pub workflow_id: WorkflowId,
    pub task_name: TaskName,
    pub generation: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique() {
        assert_ne!(WorkflowId::new(), WorkflowId::new());
    }

    #[test]
    fn string_ids_roundtrip() {
        let t = TaskName::from("approve");
        assert_eq!(t.as_str(), "approve");
        assert_eq!(t.to_string(), "approve");
    }

    #[test]
    fn definition_ref_display() {
        let r = DefinitionRef::new("greeting", 1);
        assert_eq!(r.to_string(), "greeting@1");
    }
}
