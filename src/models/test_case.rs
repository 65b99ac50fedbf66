//! Test case templates and their ordered steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::{test_case, test_step};
use crate::error::{AppError, AppResult};

use super::Priority;

/// Step text supplied when creating a test case.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTestStep {
    pub action: String,
    pub expected_result: String,
}

impl NewTestStep {
    pub fn new(action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            expected_result: expected_result.into(),
        }
    }
}

/// Request to create a test case with its steps.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewTestCase {
    pub project_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub preconditions: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    /// Steps in execution order.
    #[serde(default)]
    pub steps: Vec<NewTestStep>,
}

impl NewTestCase {
    /// Minimal case with default priority and no optional text.
    pub fn new(project_id: Uuid, name: impl Into<String>, steps: Vec<NewTestStep>) -> Self {
        Self {
            project_id,
            name: name.into(),
            description: None,
            preconditions: None,
            acceptance_criteria: None,
            priority: Priority::default(),
            owner_id: None,
            steps,
        }
    }
}

/// One step in an update patch. Steps without an id are inserted.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TestStepPatch {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub action: String,
    pub expected_result: String,
}

impl TestStepPatch {
    pub fn existing(id: Uuid, action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            action: action.into(),
            expected_result: expected_result.into(),
        }
    }

    pub fn added(action: impl Into<String>, expected_result: impl Into<String>) -> Self {
        Self {
            id: None,
            action: action.into(),
            expected_result: expected_result.into(),
        }
    }
}

/// Partial update of a test case.
///
/// When `steps` is present it is the complete desired step list, in order;
/// persisted steps absent from it are deleted.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TestCasePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub preconditions: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub priority: Option<Priority>,
    pub owner_id: Option<Uuid>,
    pub steps: Option<Vec<TestStepPatch>>,
}

/// A persisted test case (without steps).
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TestCase {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub preconditions: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub priority: Priority,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<test_case::Model> for TestCase {
    type Error = AppError;

    fn try_from(model: test_case::Model) -> AppResult<Self> {
        let priority = Priority::parse(&model.priority).ok_or_else(|| {
            AppError::Database(format!(
                "Test case {} has unknown priority '{}'",
                model.id, model.priority
            ))
        })?;

        Ok(Self {
            id: model.id,
            project_id: model.project_id,
            name: model.name,
            description: model.description,
            preconditions: model.preconditions,
            acceptance_criteria: model.acceptance_criteria,
            priority,
            owner_id: model.owner_id,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// A persisted template step.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TestStep {
    pub id: Uuid,
    pub test_case_id: Uuid,
    /// 1-based position within the case.
    pub position: i32,
    pub action: String,
    pub expected_result: String,
}

impl From<test_step::Model> for TestStep {
    fn from(model: test_step::Model) -> Self {
        Self {
            id: model.id,
            test_case_id: model.test_case_id,
            position: model.position,
            action: model.action,
            expected_result: model.expected_result,
        }
    }
}

/// A test case together with its steps in order.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct TestCaseDetail {
    #[serde(flatten)]
    pub case: TestCase,
    pub steps: Vec<TestStep>,
}
