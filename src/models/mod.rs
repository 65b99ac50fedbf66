//! Domain models for the test execution engine.

pub mod actor;
pub mod audit;
pub mod cascade;
pub mod cycle;
pub mod defect;
pub mod execution;
pub mod status;
pub mod test_case;

// Re-export commonly used types
pub use actor::{AccessLevel, Actor};
pub use audit::{AuditAction, AuditRecord, EntityKind};
pub use cascade::CascadeReport;
pub use cycle::{NewTestCycle, TestCycle, TestCyclePatch};
pub use defect::{Defect, DefectPatch, DefectSubmission, NewDefect};
pub use execution::{
    AssignedExecutionsQuery, Execution, ExecutionDetail, ExecutionStep, StepResultInput,
};
pub use status::{CycleStatus, DefectStatus, ExecutionStatus, Priority, Severity, StepOutcome};
pub use test_case::{
    NewTestCase, NewTestStep, TestCase, TestCaseDetail, TestCasePatch, TestStep, TestStepPatch,
};

/// Default page size for list queries.
pub const DEFAULT_PAGE_LIMIT: u64 = 50;

/// Upper bound for page size.
pub const MAX_PAGE_LIMIT: u64 = 100;

/// Clamp a requested page size to `1..=MAX_PAGE_LIMIT`.
pub fn clamped_limit(limit: Option<u64>) -> u64 {
    limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT)
}
