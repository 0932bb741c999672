use std::fmt;
use std::time::Duration;

use crate::recovery::{RecoveryAction, RecoveryStep};
use crate::response::ApiError;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Serialization,
    Protocol,
    AuthRecovery,
    CredentialsUnavailable,
    Cancelled,
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Transport => write!(f, "transport"),
            ErrorKind::Serialization => write!(f, "serialization"),
            ErrorKind::Protocol => write!(f, "protocol"),
            ErrorKind::AuthRecovery => write!(f, "auth_recovery"),
            ErrorKind::CredentialsUnavailable => write!(f, "credentials_unavailable"),
            ErrorKind::Cancelled => write!(f, "cancelled"),
            ErrorKind::Config => write!(f, "config"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("serialization error: {0}")]
    Serialization(String),
    /// The server answered with a failure no recovery action applies to.
    #[error("HTTP {status}: {error}")]
    Protocol { status: u16, error: ApiError },
    #[error("{action} recovery exceeded {attempts} attempt(s)")]
    RecoveryExhausted {
        action: RecoveryAction,
        attempts: u8,
    },
    #[error("{step} failed with HTTP {status}: {error}")]
    AuthRecovery {
        step: RecoveryStep,
        status: u16,
        error: ApiError,
    },
    #[error("credentials unavailable: {0}")]
    CredentialsUnavailable(String),
    #[error("operation cancelled")]
    Cancelled,
    #[error("config error: {0}")]
    Config(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) | Error::Timeout(_) => ErrorKind::Transport,
            Error::Serialization(_) => ErrorKind::Serialization,
            Error::Protocol { .. } | Error::RecoveryExhausted { .. } => ErrorKind::Protocol,
            Error::AuthRecovery { .. } => ErrorKind::AuthRecovery,
            Error::CredentialsUnavailable(_) => ErrorKind::CredentialsUnavailable,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Config(_) | Error::Io(_) => ErrorKind::Config,
        }
    }

    /// Structured server error carried by this failure, if any.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Error::Protocol { error, .. } | Error::AuthRecovery { error, .. } => Some(error),
            _ => None,
        }
    }

    /// HTTP status carried by this failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Protocol { status, .. } | Error::AuthRecovery { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
