//! Row counts removed by a cascading delete.

use serde::Serialize;
use utoipa::ToSchema;

/// Rows removed per table by one delete operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CascadeReport {
    pub test_cases: u64,
    pub test_steps: u64,
    pub test_cycles: u64,
    pub executions: u64,
    pub execution_steps: u64,
    pub defects: u64,
}

impl CascadeReport {
    pub fn total(&self) -> u64 {
        self.test_cases
            + self.test_steps
            + self.test_cycles
            + self.executions
            + self.execution_steps
            + self.defects
    }
}
