#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use rest_session_client::{
    ClientConfig, CredentialProvider, Credentials, Error, InMemoryCredentials, OpContext,
    RestApiClient,
};
use wiremock::{MockServer, Request};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.uri()).with_user_agent("rest-session-client-tests/0.1")
}

pub fn client(server: &MockServer, credentials: Arc<dyn CredentialProvider>) -> RestApiClient {
    RestApiClient::new(config(server), credentials).expect("client construction")
}

pub fn alice() -> Arc<InMemoryCredentials> {
    Arc::new(InMemoryCredentials::new("alice", "secret"))
}

/// Credentials whose provider already holds refresh token `r1`.
pub fn resumed_alice() -> Arc<InMemoryCredentials> {
    Arc::new(InMemoryCredentials::new("alice", "secret").with_refresh_token("r1"))
}

/// Requests the server saw for `path`, in arrival order.
pub async fn requests_to(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|req| req.url.path() == path)
        .collect()
}

pub fn header_value(req: &Request, name: &str) -> Option<String> {
    req.headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Provider that appends every interaction to a shared journal.
pub struct JournalingCredentials {
    inner: InMemoryCredentials,
    journal: Arc<Mutex<Vec<String>>>,
}

impl JournalingCredentials {
    pub fn new(inner: InMemoryCredentials, journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self { inner, journal }
    }
}

#[async_trait]
impl CredentialProvider for JournalingCredentials {
    async fn credentials(&self, ctx: &OpContext) -> Result<Credentials, Error> {
        self.journal.lock().unwrap().push("credentials".into());
        self.inner.credentials(ctx).await
    }

    fn refresh_token(&self) -> Option<String> {
        self.inner.refresh_token()
    }

    async fn save_refresh_token(&self, ctx: &OpContext, token: &str) {
        self.journal.lock().unwrap().push(format!("save:{token}"));
        self.inner.save_refresh_token(ctx, token).await;
    }
}
