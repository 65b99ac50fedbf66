//! Defects raised against failing executions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::entity::defect;
use crate::error::{AppError, AppResult};

use super::execution::decode_evidence;
use super::{DefectStatus, Severity};

/// Request to raise a defect.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewDefect {
    pub execution_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    #[serde(default)]
    pub evidence: Vec<String>,
}

impl NewDefect {
    pub fn new(execution_id: Uuid, title: impl Into<String>, severity: Severity) -> Self {
        Self {
            execution_id,
            title: title.into(),
            description: String::new(),
            severity,
            evidence: Vec::new(),
        }
    }
}

/// Partial update of a defect.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct DefectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub severity: Option<Severity>,
    pub status: Option<DefectStatus>,
    /// Replaces the evidence list when present.
    pub evidence: Option<Vec<String>>,
}

impl DefectPatch {
    pub fn status(status: DefectStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.severity.is_none()
            && self.status.is_none()
            && self.evidence.is_none()
    }
}

/// A persisted defect.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Defect {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    pub status: DefectStatus,
    pub evidence: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<defect::Model> for Defect {
    type Error = AppError;

    fn try_from(model: defect::Model) -> AppResult<Self> {
        let severity = Severity::parse(&model.severity).ok_or_else(|| {
            AppError::Database(format!(
                "Defect {} has unknown severity '{}'",
                model.id, model.severity
            ))
        })?;
        let status = DefectStatus::parse(&model.status).ok_or_else(|| {
            AppError::Database(format!(
                "Defect {} has unknown status '{}'",
                model.id, model.status
            ))
        })?;

        Ok(Self {
            id: model.id,
            execution_id: model.execution_id,
            title: model.title,
            description: model.description,
            severity,
            status,
            evidence: decode_evidence(&model.evidence),
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}

/// Result of a defect submission.
///
/// `is_existing` is true when an open defect with the same title was already
/// filed against the execution and was returned unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DefectSubmission {
    #[serde(flatten)]
    pub defect: Defect,
    pub is_existing: bool,
}
