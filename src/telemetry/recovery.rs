use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;
use crate::recovery::RecoveryAction;

/// Structured events for the recovery steps of one logical call.
#[derive(Clone, Debug)]
pub(crate) struct RecoveryTelemetry {
    call_id: Uuid,
    operation: String,
}

impl RecoveryTelemetry {
    pub(crate) fn new(call_id: Uuid, operation: impl Into<String>) -> Self {
        Self {
            call_id,
            operation: operation.into(),
        }
    }

    pub(crate) fn call_id(&self) -> Uuid {
        self.call_id
    }

    pub(crate) fn operation(&self) -> &str {
        &self.operation
    }

    pub(crate) fn emit_start(&self, action: RecoveryAction, attempt: u8, status: u16, code: &str) {
        event!(
            Level::WARN,
            call_id = %self.call_id,
            operation = %self.operation,
            action = %action,
            attempt,
            status,
            code,
            "recovery.start"
        );
    }

    pub(crate) fn emit_success(&self, action: RecoveryAction) {
        event!(
            Level::INFO,
            call_id = %self.call_id,
            operation = %self.operation,
            action = %action,
            "recovery.success"
        );
    }

    pub(crate) fn emit_failure(&self, action: RecoveryAction, error: &Error) {
        event!(
            Level::ERROR,
            call_id = %self.call_id,
            operation = %self.operation,
            action = %action,
            kind = %error.kind(),
            error = %error,
            "recovery.failure"
        );
    }

    pub(crate) fn emit_exhausted(&self, action: RecoveryAction, attempts: u8) {
        event!(
            Level::ERROR,
            call_id = %self.call_id,
            operation = %self.operation,
            action = %action,
            attempts,
            "recovery.exhausted"
        );
    }

    pub(crate) fn emit_skipped(&self, step: &str, error: &Error) {
        event!(
            Level::WARN,
            call_id = %self.call_id,
            operation = %self.operation,
            step,
            error = %error,
            "recovery.best_effort_failed"
        );
    }
}
