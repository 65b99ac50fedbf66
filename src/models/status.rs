//! Closed status vocabularies.
//!
//! Every enum stores its canonical lowercase form in the database. `from_legacy`
//! additionally accepts the historical Portuguese values written by earlier
//! revisions of the schema; it is only used by the normalization migration.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Aggregate status of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Allocated, no outcome recorded yet.
    Pending,
    /// At least one step recorded, no failure or block, not all approved.
    InProgress,
    /// Every step approved.
    Passed,
    /// At least one step reproved.
    Failed,
    /// No step reproved, at least one blocked.
    Blocked,
    /// A defect was fixed; the reproved steps await re-validation.
    Reteste,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Blocked => "blocked",
            Self::Reteste => "reteste",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "blocked" => Some(Self::Blocked),
            "reteste" => Some(Self::Reteste),
            _ => None,
        }
    }

    /// Map a canonical or legacy value.
    ///
    /// Returns `None` for the legacy `fechado`, which was written for passed,
    /// failed and blocked executions alike and cannot be mapped by value.
    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "pendente" => Some(Self::Pending),
            "em_progresso" => Some(Self::InProgress),
            "passou" => Some(Self::Passed),
            "falhou" | "falha" => Some(Self::Failed),
            "bloqueado" => Some(Self::Blocked),
            _ => None,
        })
    }

    /// Statuses an authorized actor may force through `finalize`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Passed | Self::Failed | Self::Blocked)
    }

    /// Statuses that still block a duplicate allocation or a cycle completion.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress | Self::Reteste)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome recorded for a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Pending,
    Approved,
    Reproved,
    Blocked,
}

impl StepOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Reproved => "reproved",
            Self::Blocked => "blocked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "reproved" => Some(Self::Reproved),
            "blocked" => Some(Self::Blocked),
            _ => None,
        }
    }

    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "pendente" => Some(Self::Pending),
            "aprovado" => Some(Self::Approved),
            "reprovado" => Some(Self::Reproved),
            "bloqueado" => Some(Self::Blocked),
            _ => None,
        })
    }
}

impl std::fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Defect remediation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DefectStatus {
    Open,
    InReview,
    /// Fix delivered, awaiting retest.
    Fixed,
    Closed,
}

impl DefectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InReview => "in_review",
            Self::Fixed => "fixed",
            Self::Closed => "closed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "open" => Some(Self::Open),
            "in_review" => Some(Self::InReview),
            "fixed" => Some(Self::Fixed),
            "closed" => Some(Self::Closed),
            _ => None,
        }
    }

    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "aberto" => Some(Self::Open),
            "em_teste" => Some(Self::InReview),
            "corrigido" => Some(Self::Fixed),
            "fechado" => Some(Self::Closed),
            _ => None,
        })
    }
}

impl std::fmt::Display for DefectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Defect severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "critico" => Some(Self::Critical),
            "alto" => Some(Self::High),
            "medio" => Some(Self::Medium),
            "baixo" => Some(Self::Low),
            _ => None,
        })
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Test case priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "alta" => Some(Self::High),
            "media" => Some(Self::Medium),
            "baixa" => Some(Self::Low),
            _ => None,
        })
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a test cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    #[default]
    Planned,
    Running,
    Completed,
    Paused,
    Cancelled,
    Error,
}

impl CycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Error => "error",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "planned" => Some(Self::Planned),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "paused" => Some(Self::Paused),
            "cancelled" => Some(Self::Cancelled),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    pub fn from_legacy(s: &str) -> Option<Self> {
        Self::parse(s).or(match s {
            "planejado" => Some(Self::Planned),
            "em_execucao" => Some(Self::Running),
            "concluido" => Some(Self::Completed),
            "pausado" => Some(Self::Paused),
            "cancelado" => Some(Self::Cancelled),
            "erro" => Some(Self::Error),
            _ => None,
        })
    }
}

impl std::fmt::Display for CycleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
