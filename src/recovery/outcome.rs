use std::time::Duration;

use tracing::Level;
use tracing::event;
use uuid::Uuid;

use super::RecoveryAction;

/// Summary of one logical call through the recovery controller.
#[derive(Debug, Clone)]
pub struct RecoveryOutcome {
    pub call_id: Uuid,
    pub operation: String,
    pub actions: Vec<RecoveryAction>,
    pub requests_sent: u8,
    pub success: bool,
    pub total_elapsed: Duration,
}

impl RecoveryOutcome {
    pub fn recovered(&self) -> bool {
        !self.actions.is_empty()
    }

    pub fn log(&self) {
        let actions = self
            .actions
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        event!(
            Level::INFO,
            call_id = %self.call_id,
            operation = %self.operation,
            actions = %actions,
            requests_sent = self.requests_sent,
            success = self.success,
            total_elapsed_ms = self.total_elapsed.as_millis() as u64,
            "recovery.outcome"
        );
    }
}
