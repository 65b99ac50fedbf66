//! Audit trail of committed mutations.
//!
//! The engine publishes one [`AuditRecord`] per mutation once its transaction
//! has committed. Persisting and querying the trail belongs to the audit-log
//! collaborator, which holds a subscription. Publishing is fire-and-forget: a
//! trail nobody listens to drops its records, and a lagging subscriber loses
//! the oldest ones, but neither ever fails or delays the mutation.

use tokio::sync::broadcast;

use crate::models::AuditRecord;

/// Records a subscriber may fall behind by before it starts losing them.
const DEFAULT_BACKLOG: usize = 1000;

/// Publisher side of the audit trail. Clones share the same subscribers.
#[derive(Clone)]
pub struct AuditTrail {
    sender: broadcast::Sender<AuditRecord>,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::with_backlog(DEFAULT_BACKLOG)
    }

    pub fn with_backlog(backlog: usize) -> Self {
        let (sender, _) = broadcast::channel(backlog);
        Self { sender }
    }

    /// Attach a collaborator. It sees only records published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditRecord> {
        self.sender.subscribe()
    }

    /// Publish the record of a committed mutation.
    ///
    /// Returns how many subscribers it reached; zero means it was dropped.
    pub fn publish(&self, record: AuditRecord) -> usize {
        match self.sender.send(record) {
            Ok(reached) => reached,
            Err(broadcast::error::SendError(_dropped)) => 0,
        }
    }
}

impl Default for AuditTrail {
    fn default() -> Self {
        Self::new()
    }
}
