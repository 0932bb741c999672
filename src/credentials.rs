use std::fmt;
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;

use crate::errors::Error;
use crate::request_context::OpContext;

/// Login and password, handed out only for the duration of one login handshake.
#[derive(Clone)]
pub struct Credentials {
    pub login: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: SecretString::from(password.into()),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Supplies credentials on demand and persists the refresh token across restarts.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Login and password for a fresh session.
    async fn credentials(&self, ctx: &OpContext) -> Result<Credentials, Error>;

    /// Refresh token persisted by an earlier process, if any.
    fn refresh_token(&self) -> Option<String>;

    async fn save_refresh_token(&self, ctx: &OpContext, token: &str);
}

/// Keeps credentials and the refresh token in memory.
#[derive(Default)]
pub struct InMemoryCredentials {
    credentials: Option<Credentials>,
    refresh_token: Mutex<Option<String>>,
}

impl InMemoryCredentials {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Some(Credentials::new(login, password)),
            refresh_token: Mutex::new(None),
        }
    }

    /// A provider that can only resume a session from a stored refresh token.
    pub fn without_credentials() -> Self {
        Self::default()
    }

    pub fn with_refresh_token(self, token: impl Into<String>) -> Self {
        if let Ok(mut slot) = self.refresh_token.lock() {
            *slot = Some(token.into());
        }
        self
    }

    pub fn stored_refresh_token(&self) -> Option<String> {
        self.refresh_token.lock().ok().and_then(|slot| slot.clone())
    }
}

#[async_trait]
impl CredentialProvider for InMemoryCredentials {
    async fn credentials(&self, _ctx: &OpContext) -> Result<Credentials, Error> {
        self.credentials
            .clone()
            .ok_or_else(|| Error::CredentialsUnavailable("no credentials configured".into()))
    }

    fn refresh_token(&self) -> Option<String> {
        self.stored_refresh_token().filter(|t| !t.is_empty())
    }

    async fn save_refresh_token(&self, _ctx: &OpContext, token: &str) {
        if let Ok(mut slot) = self.refresh_token.lock() {
            *slot = Some(token.to_string());
        }
    }
}
