use std::fmt;

use serde::Serialize;

use crate::config::ErrorCodes;
use crate::response::Response;
use crate::session::SessionState;

/// Corrective action for an authentication failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryAction {
    None,
    RefreshCsrf,
    Login,
    RefreshToken,
}

impl RecoveryAction {
    /// Picks the action for `response`. Success responses never trigger recovery;
    /// failures are matched in priority order: anti-forgery, login, token refresh.
    pub fn select(response: &Response, session: &SessionState, codes: &ErrorCodes) -> Self {
        let Some(error) = response.error() else {
            return RecoveryAction::None;
        };
        let code = error.code.as_str();

        if codes.is_csrf_error(code) {
            return RecoveryAction::RefreshCsrf;
        }
        if !session.has_refresh_token()
            || codes.is_relogin_required(code)
            || codes.is_login_failed(code)
        {
            return RecoveryAction::Login;
        }
        if !session.has_access_token() || codes.is_refresh_required(code) {
            return RecoveryAction::RefreshToken;
        }
        RecoveryAction::None
    }
}

impl fmt::Display for RecoveryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryAction::None => write!(f, "none"),
            RecoveryAction::RefreshCsrf => write!(f, "refresh_csrf"),
            RecoveryAction::Login => write!(f, "login"),
            RecoveryAction::RefreshToken => write!(f, "refresh_token"),
        }
    }
}

/// Individual handshake request that can fail during recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStep {
    CsrfProbe,
    LoginChallenge,
    LoginProof,
    TokenRefresh,
}

impl fmt::Display for RecoveryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryStep::CsrfProbe => write!(f, "csrf_probe"),
            RecoveryStep::LoginChallenge => write!(f, "login_challenge"),
            RecoveryStep::LoginProof => write!(f, "login_proof"),
            RecoveryStep::TokenRefresh => write!(f, "token_refresh"),
        }
    }
}
