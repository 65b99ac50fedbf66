//! The execution engine handle shared by every component.

use tracing::debug;
use uuid::Uuid;

use crate::config::EngineSettings;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{Actor, AuditAction, AuditRecord, EntityKind};

use super::AuditTrail;

/// Entry point of the test execution lifecycle.
///
/// Each component (catalog, cycles, orchestrator, step results, aggregator,
/// defects, cascade deletion) contributes an `impl Engine` block in its own
/// module. Every mutating operation runs in one transaction and emits its
/// audit record only after commit.
#[derive(Clone)]
pub struct Engine {
    pub(crate) pool: DbPool,
    pub(crate) audit: AuditTrail,
    pub(crate) settings: EngineSettings,
}

impl Engine {
    /// Create an engine with its own audit trail.
    pub fn new(pool: DbPool, settings: EngineSettings) -> Self {
        Self::with_audit_trail(pool, AuditTrail::new(), settings)
    }

    /// Create an engine publishing to an existing audit trail.
    pub fn with_audit_trail(pool: DbPool, audit: AuditTrail, settings: EngineSettings) -> Self {
        Self {
            pool,
            audit,
            settings,
        }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub(crate) fn record(
        &self,
        actor: &Actor,
        action: AuditAction,
        entity_kind: EntityKind,
        entity_id: Uuid,
        detail: impl Into<String>,
    ) {
        let receivers = self.audit.publish(AuditRecord::new(
            actor.id,
            action,
            entity_kind,
            entity_id,
            detail,
        ));
        debug!(?action, ?entity_kind, %entity_id, receivers, "Audit record published");
    }

    /// Reject blank references and lists longer than the evidence limit.
    pub(crate) fn check_evidence(&self, evidence: &[String]) -> AppResult<()> {
        if evidence.iter().any(|reference| reference.trim().is_empty()) {
            return Err(AppError::Rejected(
                "evidence references must not be blank".to_string(),
            ));
        }
        if evidence.len() > self.settings.evidence_limit {
            return Err(AppError::Rejected("evidence limit exceeded".to_string()));
        }
        Ok(())
    }
}

/// Width of the name and title columns.
pub(crate) const MAX_NAME_CHARS: usize = 255;

/// Trimmed text, or `Rejected` naming `field` when it is blank.
pub(crate) fn required_text(field: &str, value: &str) -> AppResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Rejected(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// [`required_text`] for values stored in a name or title column.
pub(crate) fn required_name(field: &str, value: &str) -> AppResult<String> {
    let name = required_text(field, value)?;
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(AppError::Rejected(format!(
            "{field} must not exceed {MAX_NAME_CHARS} characters"
        )));
    }
    Ok(name)
}
