use serde::Deserialize;

use crate::errors::Error;

use super::RecoveryAction;

/// Per logical call caps, one per failure class.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecoveryLimits {
    pub max_csrf_refreshes: u8,
    pub max_logins: u8,
    pub max_token_refreshes: u8,
}

impl RecoveryLimits {
    pub fn new(max_csrf_refreshes: u8, max_logins: u8, max_token_refreshes: u8) -> Self {
        Self {
            max_csrf_refreshes,
            max_logins,
            max_token_refreshes,
        }
    }

    pub fn limit_for(&self, action: RecoveryAction) -> u8 {
        match action {
            RecoveryAction::None => 0,
            RecoveryAction::RefreshCsrf => self.max_csrf_refreshes,
            RecoveryAction::Login => self.max_logins,
            RecoveryAction::RefreshToken => self.max_token_refreshes,
        }
    }
}

impl Default for RecoveryLimits {
    fn default() -> Self {
        Self::new(3, 2, 3)
    }
}

/// Attempt counters for one logical call.
#[derive(Clone, Debug)]
pub(crate) struct RecoveryBudget {
    limits: RecoveryLimits,
    csrf: u8,
    login: u8,
    refresh: u8,
}

impl RecoveryBudget {
    pub(crate) fn new(limits: RecoveryLimits) -> Self {
        Self {
            limits,
            csrf: 0,
            login: 0,
            refresh: 0,
        }
    }

    /// Records one more attempt of `action`, returning its 1-based attempt number.
    pub(crate) fn try_consume(&mut self, action: RecoveryAction) -> Result<u8, Error> {
        let limit = self.limits.limit_for(action);
        let used = match action {
            RecoveryAction::None => return Ok(0),
            RecoveryAction::RefreshCsrf => &mut self.csrf,
            RecoveryAction::Login => &mut self.login,
            RecoveryAction::RefreshToken => &mut self.refresh,
        };
        if *used >= limit {
            return Err(Error::RecoveryExhausted {
                action,
                attempts: *used,
            });
        }
        *used += 1;
        Ok(*used)
    }
}
