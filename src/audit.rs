// Transaction/audit logging collaborator.
//
// Audit logging is strictly best-effort: the injury service catches failures
// at one boundary, emits a `tracing` warning, and carries on. No audit
// failure may ever fail the primary operation.

use std::sync::Mutex;

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A single audit event as recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event kind, e.g. "injury", "ir_placement", "ir_activation".
    pub kind: String,
    pub player_id: String,
    pub team_id: String,
    /// Structured event payload.
    pub details: serde_json::Value,
}

/// Audit/transaction logger supplied by the surrounding simulator.
pub trait AuditLog: Send + Sync {
    fn log(&self, kind: &str, player_id: &str, team_id: &str, details: serde_json::Value)
        -> Result<()>;
}

/// Audit sink that forwards events to `tracing` at info level.
pub struct LogAudit;

impl AuditLog for LogAudit {
    fn log(
        &self,
        kind: &str,
        player_id: &str,
        team_id: &str,
        details: serde_json::Value,
    ) -> Result<()> {
        tracing::info!(kind, player_id, team_id, %details, "audit event");
        Ok(())
    }
}

/// In-memory audit sink, used by tests and the exhibition orchestrator.
#[derive(Default)]
pub struct MemoryAudit {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().expect("audit mutex poisoned").clone()
    }
}

impl AuditLog for MemoryAudit {
    fn log(
        &self,
        kind: &str,
        player_id: &str,
        team_id: &str,
        details: serde_json::Value,
    ) -> Result<()> {
        self.events
            .lock()
            .expect("audit mutex poisoned")
            .push(AuditEvent {
                kind: kind.to_string(),
                player_id: player_id.to_string(),
                team_id: team_id.to_string(),
                details,
            });
        Ok(())
    }
}
