//! read client configuration from a file or the environment

use std::time::Duration;

use serde::Deserialize;

use crate::errors::Error;
use crate::recovery::RecoveryLimits;

pub enum ConfigLocation {
    File(String),
    Env,
}

/// Wire header names used for session tokens and the login handshake.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct HeaderNames {
    pub access_token: String,
    pub refresh_token: String,
    pub csrf_token: String,
    pub login_name: String,
    pub login_salt: String,
    pub login_proof: String,
    pub sms_code: String,
    pub sms_token: String,
}

impl Default for HeaderNames {
    fn default() -> Self {
        Self {
            access_token: "x-auth-access-token".into(),
            refresh_token: "x-auth-refresh-token".into(),
            csrf_token: "x-csrf".into(),
            login_name: "x-auth-login".into(),
            login_salt: "x-auth-login-salt".into(),
            login_proof: "x-auth-login-phash".into(),
            sms_code: "x-auth-sms-code".into(),
            sms_token: "x-auth-sms-token".into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub login: String,
    pub logout: String,
    pub refresh: String,
    pub status: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            logout: "/auth/logout".into(),
            refresh: "/auth/refresh".into(),
            status: "/status/check".into(),
        }
    }
}

/// Server error codes, grouped by the recovery role they play.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ErrorCodes {
    pub csrf_invalid: Vec<String>,
    pub credentials_required: String,
    pub login_failed: String,
    pub refresh_required: Vec<String>,
    pub relogin_required: Vec<String>,
}

impl ErrorCodes {
    pub fn is_csrf_error(&self, code: &str) -> bool {
        self.csrf_invalid.iter().any(|c| c == code)
    }

    pub fn is_relogin_required(&self, code: &str) -> bool {
        self.relogin_required.iter().any(|c| c == code)
    }

    pub fn is_refresh_required(&self, code: &str) -> bool {
        self.refresh_required.iter().any(|c| c == code)
    }

    pub fn is_login_failed(&self, code: &str) -> bool {
        !code.is_empty() && code == self.login_failed
    }

    pub fn is_credentials_required(&self, code: &str) -> bool {
        !code.is_empty() && code == self.credentials_required
    }
}

impl Default for ErrorCodes {
    fn default() -> Self {
        Self {
            csrf_invalid: vec![
                "csrf_token_required".into(),
                "csrf_token_invalid".into(),
                "csrf_token_expired".into(),
            ],
            credentials_required: "credentials_required".into(),
            login_failed: "login_failed".into(),
            refresh_required: vec!["token_expired".into()],
            relogin_required: vec![
                "session_expired".into(),
                "refresh_token_invalid".into(),
                "token_invalid".into(),
            ],
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub headers: HeaderNames,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub error_codes: ErrorCodes,
    #[serde(default)]
    pub recovery: RecoveryLimits,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            user_agent: None,
            timeout_secs: None,
            headers: HeaderNames::default(),
            endpoints: Endpoints::default(),
            error_codes: ErrorCodes::default(),
            recovery: RecoveryLimits::default(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_recovery(mut self, recovery: RecoveryLimits) -> Self {
        self.recovery = recovery;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Base URL with a scheme and without a trailing slash.
    pub fn normalized_base_url(&self) -> Result<String, Error> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(Error::Config("base_url must not be empty".into()));
        }
        let base = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };
        reqwest::Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid base URL '{}': {}", base, e)))?;
        Ok(base)
    }

    pub async fn load(loc: ConfigLocation) -> Result<Self, Error> {
        read_config(loc).await
    }
}

pub(crate) async fn read_config(loc: ConfigLocation) -> Result<ClientConfig, Error> {
    let config = match loc {
        ConfigLocation::File(path) => {
            let contents = tokio::fs::read_to_string(path).await?;
            serde_json::from_str(&contents)?
        }
        ConfigLocation::Env => read_config_from_env()?,
    };
    Ok(config)
}

fn read_config_from_env() -> Result<ClientConfig, Error> {
    let mut config = ClientConfig::new(
        std::env::var("REST_CLIENT_BASE_URL")
            .map_err(|_| Error::Config("Missing REST_CLIENT_BASE_URL env var".to_string()))?,
    );
    config.user_agent = std::env::var("REST_CLIENT_USER_AGENT").ok();
    config.timeout_secs = env_number("REST_CLIENT_TIMEOUT_SECS")?;
    if let Some(max) = env_number("REST_CLIENT_MAX_CSRF_REFRESHES")? {
        config.recovery.max_csrf_refreshes = max;
    }
    if let Some(max) = env_number("REST_CLIENT_MAX_LOGINS")? {
        config.recovery.max_logins = max;
    }
    if let Some(max) = env_number("REST_CLIENT_MAX_TOKEN_REFRESHES")? {
        config.recovery.max_token_refreshes = max;
    }
    Ok(config)
}

fn env_number<T: std::str::FromStr>(name: &str) -> Result<Option<T>, Error> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::Config(format!("{name} must be a number, got '{raw}'"))),
        Err(_) => Ok(None),
    }
}
