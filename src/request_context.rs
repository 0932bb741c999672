use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::errors::Error;

/// Per logical call context: a correlation id for telemetry plus the
/// caller's cancellation signal.
#[derive(Clone, Debug)]
pub struct OpContext {
    id: Uuid,
    cancel: CancellationToken,
}

impl OpContext {
    pub fn new() -> Self {
        Self::with_cancellation(CancellationToken::new())
    }

    pub fn with_cancellation(cancel: CancellationToken) -> Self {
        Self {
            id: Uuid::new_v4(),
            cancel,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fails with [`Error::Cancelled`] once the caller gave up.
    pub fn ensure_active(&self) -> Result<(), Error> {
        if self.cancel.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for OpContext {
    fn default() -> Self {
        Self::new()
    }
}
