//! Business logic services.

pub mod aggregator;
pub mod audit;
pub mod cascade;
pub mod catalog;
pub mod cycles;
pub mod defects;
mod engine;
pub mod orchestrator;
pub mod step_results;

pub use aggregator::{derive_status, refresh_execution_status};
pub use audit::AuditTrail;
pub use engine::Engine;
