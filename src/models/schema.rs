// Payload codec registry
//
//! A `WorkflowDefinition` only carries a `SchemaId` per task
//! (`TaskDefinition::payload_schema`); the actual validation logic lives
//! here, registered once per host by name — the same "definition stays
//! plain data, behavior is injected by the host" split `TaskCallback`
//! (`engine::callbacks`) uses.

use super::ids::SchemaId;
use crate::error::{Result, WorkflowError};
use serde_json::Value;
use std::collections::HashMap;

/// A codec validates (and, in the general case, could transform) a
/// task's input or output payload. The concrete schema language is left
/// open; `RequiredFieldsCodec` covers the simplest useful case — required
/// top-level object keys — without pulling in a full JSON-Schema crate.
pub trait PayloadCodec: Send + Sync {
    fn validate(&self, payload: &Value) -> std::result::Result<(), String>;
}

/// Rejects a payload unless it is a JSON object containing every field
/// in `fields`.
pub struct RequiredFieldsCodec {
    pub fields: Vec<String>,
}

impl RequiredFieldsCodec {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        RequiredFieldsCodec {
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl PayloadCodec for RequiredFieldsCodec {
    fn validate(&self, payload: &Value) -> std::result::Result<(), String> {
        let obj = payload
            .as_object()
            .ok_or_else(|| "payload is not a JSON object".to_string())?;
        for field in &self.fields {
            if !obj.contains_key(field) {
                return Err(format!("missing required field '{field}'"));
            }
        }
        Ok(())
    }
}

/// Host-supplied registry of codecs, keyed by `SchemaId`.
#[derive(Default)]
pub struct PayloadRegistry {
    codecs: HashMap<SchemaId, Box<dyn PayloadCodec>>,
}

impl PayloadRegistry {
    pub fn new() -> Self {
        PayloadRegistry {
            codecs: HashMap::new(),
        }
    }

    pub fn register(mut self, id: SchemaId, codec: Box<dyn PayloadCodec>) -> Self {
        self.codecs.insert(id, codec);
        self
    }

    /// No-ops when the task declares no `payload_schema`. Otherwise looks
    /// up the registered codec and maps a validation failure to
    /// `WorkflowError::SchemaMismatch`.
    pub fn validate_task(
        &self,
        task: &super::definition::TaskDefinition,
        payload: &Value,
    ) -> Result<()> {
        let Some(schema_id) = &task.payload_schema else {
            return Ok(());
        };
        let codec = self.codecs.get(schema_id).ok_or_else(|| {
            WorkflowError::SchemaMismatch {
                task: task.name.to_string(),
                detail: format!("no codec registered for schema '{schema_id}'"),
            }
        })?;
        codec
            .validate(payload)
            .map_err(|detail| WorkflowError::SchemaMismatch {
                task: task.name.to_string(),
                detail,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::definition::{JoinKind, SplitKind, TaskDefinition, TaskKind};
    use serde_json::json;

    fn task_with_schema(id: SchemaId) -> TaskDefinition {
        TaskDefinition::new("greet", TaskKind::Automated, JoinKind::Xor, SplitKind::Xor)
            .with_payload_schema(id)
    }

    #[test]
    fn unschema_tasks_skip_validation() {
        let registry = PayloadRegistry::new();
        let task =
            TaskDefinition::new("greet", TaskKind::Automated, JoinKind::Xor, SplitKind::Xor);
        assert!(registry.validate_task(&task, &json!(null)).is_ok());
    }

    #[test]
    fn rejects_payload_missing_required_field() {
        let id = SchemaId::new("greeting.v1");
        let registry = PayloadRegistry::new().register(
            id.clone(),
            Box::new(RequiredFieldsCodec::new(["message"])),
        );
        let task = task_with_schema(id);
        let result = registry.validate_task(&task, &json!({}));
        assert!(matches!(result, Err(WorkflowError::SchemaMismatch { .. })));
    }

    #[test]
    fn accepts_payload_with_required_field() {
        let id = SchemaId::new("greeting.v1");
        let registry = PayloadRegistry::new().register(
            id.clone(),
            Box::new(RequiredFieldsCodec::new(["message"])),
        );
        let task = task_with_schema(id);
        let result = registry.validate_task(&task, &json!({"message": "hi"}));
        assert!(result.is_ok());
    }

    #[test]
    fn unregistered_schema_id_is_a_mismatch() {
        let registry = PayloadRegistry::new();
        let task = task_with_schema(SchemaId::new("missing"));
        let result = registry.validate_task(&task, &json!({}));
        assert!(matches!(result, Err(WorkflowError::SchemaMismatch { .. })));
    }
}
