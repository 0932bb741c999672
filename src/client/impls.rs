use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{
    RestApiClient,
    config::{ClientConfig, ConfigLocation, read_config},
    credentials::CredentialProvider,
    dispatcher::Dispatcher,
    errors::Error,
    proof::{HmacSha256Proof, PasswordProof},
    recovery::{RecoveryController, RecoveryOutcome},
    request::RequestDescriptor,
    request_context::OpContext,
    response::Response,
    session::SessionState,
    transport::{ReqwestTransport, Transport},
};

impl RestApiClient {
    /// Create a new RestApiClient backed by `reqwest`
    /// # Arguments
    /// * `config` - Explicit configuration, typically loaded via `ClientConfig::load`
    /// * `credentials` - Supplies login/password on demand and stores the refresh token
    ///
    /// A refresh token already stored by `credentials` is loaded into the session,
    /// so a restarted process resumes its session without logging in again.
    pub fn new(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, Error> {
        let transport = ReqwestTransport::default().with_timeout(config.timeout());
        Self::with_transport(config, credentials, Arc::new(transport))
    }

    /// Create a client from a config file or the environment.
    /// # ENV Vars (when using `ConfigLocation::Env`)
    /// * `REST_CLIENT_BASE_URL` - API base URL (required)
    /// * `REST_CLIENT_USER_AGENT` - Optional user agent
    /// * `REST_CLIENT_TIMEOUT_SECS` - Optional per-request timeout
    /// * `REST_CLIENT_MAX_CSRF_REFRESHES`, `REST_CLIENT_MAX_LOGINS`,
    ///   `REST_CLIENT_MAX_TOKEN_REFRESHES` - Recovery caps per logical call
    pub async fn from_location(
        location: ConfigLocation,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, Error> {
        let config = read_config(location).await?;
        Self::new(config, credentials)
    }

    pub fn with_transport(
        config: ClientConfig,
        credentials: Arc<dyn CredentialProvider>,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, Error> {
        let base_url = config.normalized_base_url()?;
        let mut session = SessionState::new(base_url, config.user_agent.clone());
        if let Some(token) = credentials.refresh_token() {
            session.set_refresh_token(token);
        }
        info!(
            base_url = %session.base_url(),
            resumed = session.has_refresh_token(),
            "client.created"
        );
        Ok(RestApiClient {
            dispatcher: Dispatcher::new(transport, session, config.headers),
            credentials,
            proof: Arc::new(HmacSha256Proof),
            endpoints: config.endpoints,
            recovery: RecoveryController::new(config.recovery, config.error_codes),
        })
    }

    /// Replaces the password proof function used by the login handshake.
    pub fn with_proof(mut self, proof: Arc<dyn PasswordProof>) -> Self {
        self.proof = proof;
        self
    }

    pub async fn session(&self) -> SessionState {
        self.dispatcher.session().await
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub async fn send(&self, request: &RequestDescriptor) -> Result<Response, Error> {
        self.send_with(&OpContext::new(), request).await
    }

    /// Sends `request`, recovering from authentication failures. Failure
    /// responses no recovery applies to are returned as `Ok`.
    pub async fn send_with(
        &self,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> Result<Response, Error> {
        self.send_with_outcome(ctx, request).await.0
    }

    pub async fn send_with_outcome(
        &self,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> (Result<Response, Error>, RecoveryOutcome) {
        self.recovery.execute(self, ctx, request).await
    }

    /// Sends `request` and deserializes a successful body into `T`.
    /// Unrecovered failures surface as [`Error::Protocol`].
    pub async fn call<T: DeserializeOwned>(
        &self,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> Result<T, Error> {
        self.send_with(ctx, request).await?.json()
    }

    pub async fn get<Q, T>(&self, ctx: &OpContext, path: &str, query: &Q) -> Result<T, Error>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::get(path).with_payload(query)?;
        self.call(ctx, &request).await
    }

    pub async fn post<B, T>(&self, ctx: &OpContext, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::post(path).with_payload(body)?;
        self.call(ctx, &request).await
    }

    pub async fn put<B, T>(&self, ctx: &OpContext, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::put(path).with_payload(body)?;
        self.call(ctx, &request).await
    }

    pub async fn patch<B, T>(&self, ctx: &OpContext, path: &str, body: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::patch(path).with_payload(body)?;
        self.call(ctx, &request).await
    }

    pub async fn delete<Q, T>(&self, ctx: &OpContext, path: &str, query: &Q) -> Result<T, Error>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = RequestDescriptor::delete(path).with_payload(query)?;
        self.call(ctx, &request).await
    }
}
