//! Test cycles: time-boxed windows that executions are scheduled into.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::test_cycle;
use crate::error::{AppError, AppResult};

use super::CycleStatus;

/// Request to create a test cycle.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTestCycle {
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewTestCycle {
    pub fn new(project_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            starts_at: None,
            ends_at: None,
        }
    }
}

/// Partial update of a test cycle.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TestCyclePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: Option<CycleStatus>,
}

/// A persisted test cycle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TestCycle {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// Sequential number within the project, starting at 1.
    pub number: i32,
    pub description: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub status: CycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<test_cycle::Model> for TestCycle {
    type Error = AppError;

    fn try_from(model: test_cycle::Model) -> AppResult<Self> {
        let status = CycleStatus::parse(&model.status).ok_or_else(|| {
            AppError::Database(format!(
                "Test cycle {} has unknown status '{}'",
                model.id, model.status
            ))
        })?;

        Ok(Self {
            id: model.id,
            project_id: model.project_id,
            name: model.name,
            number: model.number,
            description: model.description,
            starts_at: model.starts_at,
            ends_at: model.ends_at,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
