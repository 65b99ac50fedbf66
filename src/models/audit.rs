//! Audit records handed to the audit-log collaborator.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// Kind of mutation recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

/// Kind of entity a record refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    TestCase,
    TestCycle,
    Execution,
    ExecutionStep,
    Defect,
}

/// One fire-and-forget audit record.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct AuditRecord {
    pub actor_id: Uuid,
    pub action: AuditAction,
    pub entity_kind: EntityKind,
    pub entity_id: Uuid,
    pub detail: String,
    pub recorded_at: DateTime<Utc>,
}

impl AuditRecord {
    pub fn new(
        actor_id: Uuid,
        action: AuditAction,
        entity_kind: EntityKind,
        entity_id: Uuid,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            actor_id,
            action,
            entity_kind,
            entity_id,
            detail: detail.into(),
            recorded_at: Utc::now(),
        }
    }
}
