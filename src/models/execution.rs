//! Executions and their per-step outcome records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{execution, execution_step};
use crate::error::{AppError, AppResult};

use super::{ExecutionStatus, StepOutcome};

/// Decode a stored evidence column.
///
/// The column normally holds a JSON array of references. Values written
/// before the array format existed hold a single bare reference.
pub fn decode_evidence(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<String>>(trimmed) {
        Ok(list) => list,
        Err(_) => vec![trimmed.to_string()],
    }
}

/// Encode an evidence list for storage.
pub fn encode_evidence(evidence: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(evidence)?)
}

/// A persisted execution.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Execution {
    pub id: Uuid,
    pub test_cycle_id: Uuid,
    pub test_case_id: Uuid,
    pub assignee_id: Uuid,
    pub status: ExecutionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<execution::Model> for Execution {
    type Error = AppError;

    fn try_from(model: execution::Model) -> AppResult<Self> {
        let status = ExecutionStatus::parse(&model.status).ok_or_else(|| {
            AppError::Database(format!(
                "Execution {} has unknown status '{}'",
                model.id, model.status
            ))
        })?;

        Ok(Self {
            id: model.id,
            test_cycle_id: model.test_cycle_id,
            test_case_id: model.test_case_id,
            assignee_id: model.assignee_id,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// The mutable outcome record of one step of an execution.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExecutionStep {
    pub id: Uuid,
    pub execution_id: Uuid,
    /// Originating template step, kept for comparison and display only.
    pub test_step_id: Uuid,
    pub position: i32,
    pub action: String,
    pub expected_result: String,
    pub outcome: StepOutcome,
    pub actual_result: Option<String>,
    pub evidence: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<execution_step::Model> for ExecutionStep {
    type Error = AppError;

    fn try_from(model: execution_step::Model) -> AppResult<Self> {
        let outcome = StepOutcome::parse(&model.outcome).ok_or_else(|| {
            AppError::Database(format!(
                "Execution step {} has unknown outcome '{}'",
                model.id, model.outcome
            ))
        })?;

        Ok(Self {
            id: model.id,
            execution_id: model.execution_id,
            test_step_id: model.test_step_id,
            position: model.position,
            action: model.action,
            expected_result: model.expected_result,
            outcome,
            actual_result: model.actual_result,
            evidence: decode_evidence(&model.evidence),
            updated_at: model.updated_at,
        })
    }
}

/// An execution together with its steps in snapshot order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ExecutionDetail {
    #[serde(flatten)]
    pub execution: Execution,
    pub steps: Vec<ExecutionStep>,
}

/// Outcome submitted by a tester for one execution step.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StepResultInput {
    pub outcome: StepOutcome,
    /// Replaces the free-text result when present.
    #[serde(default)]
    pub actual_result: Option<String>,
    /// References appended to the step's evidence list.
    #[serde(default)]
    pub evidence: Option<Vec<String>>,
}

impl StepResultInput {
    pub fn outcome(outcome: StepOutcome) -> Self {
        Self {
            outcome,
            actual_result: None,
            evidence: None,
        }
    }

    pub fn with_result(mut self, actual_result: impl Into<String>) -> Self {
        self.actual_result = Some(actual_result.into());
        self
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = Some(evidence);
        self
    }
}

/// Filter for an assignee's execution list.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct AssignedExecutionsQuery {
    pub status: Option<ExecutionStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}
