//! Session handshakes: anti-forgery probe, salted login, token refresh,
//! logout and SMS confirmation.

use async_trait::async_trait;
use tracing::{info, warn};

use crate::{
    RestApiClient,
    credentials::Credentials,
    errors::Error,
    recovery::{RecoveryHandler, RecoveryStep},
    request::RequestDescriptor,
    request_context::OpContext,
    response::{ApiError, Response},
    session::SessionState,
};

impl RestApiClient {
    /// Status probe; the response headers carry a fresh anti-forgery token.
    pub async fn update_csrf_token(&self, ctx: &OpContext) -> Result<Response, Error> {
        let probe = RequestDescriptor::get(self.endpoints.status.as_str());
        let resp = self.dispatcher.send(ctx, &probe).await?;
        expect_success(resp, RecoveryStep::CsrfProbe)
    }

    /// Obtains an initial anti-forgery token before the first real request.
    pub async fn prepare(&self, ctx: &OpContext) -> Result<Response, Error> {
        self.update_csrf_token(ctx).await
    }

    /// Two-step login: announce the login name to get a salt, then answer
    /// with the password proof. Tokens arrive in the headers of the second reply.
    pub async fn login(
        &self,
        ctx: &OpContext,
        credentials: &Credentials,
    ) -> Result<Response, Error> {
        let names = self.dispatcher.header_names();
        info!(call_id = %ctx.id(), login = %credentials.login, "login.start");

        ctx.ensure_active()?;
        let challenge = RequestDescriptor::post(self.endpoints.login.as_str())
            .with_header(names.login_name.as_str(), credentials.login.as_str());
        let resp = self.dispatcher.send(ctx, &challenge).await?;
        if !self.recovery.codes().is_credentials_required(resp.error_code()) {
            warn!(
                call_id = %ctx.id(),
                status = resp.status(),
                code = resp.error_code(),
                "login.unexpected_challenge"
            );
            return Err(step_error(&resp, RecoveryStep::LoginChallenge));
        }
        let Some(salt) = resp.header(&names.login_salt).filter(|s| !s.is_empty()) else {
            return Err(Error::AuthRecovery {
                step: RecoveryStep::LoginChallenge,
                status: resp.status(),
                error: ApiError::new("missing_salt", "login challenge carried no salt"),
            });
        };
        let proof = self.proof.proof(&credentials.password, salt);

        ctx.ensure_active()?;
        let answer = challenge.with_header(names.login_proof.as_str(), proof);
        let resp = self.dispatcher.send(ctx, &answer).await?;
        if !resp.is_success() {
            warn!(
                call_id = %ctx.id(),
                status = resp.status(),
                code = resp.error_code(),
                "login.rejected"
            );
            return Err(step_error(&resp, RecoveryStep::LoginProof));
        }
        info!(call_id = %ctx.id(), login = %credentials.login, "login.success");
        Ok(resp)
    }

    /// Exchanges the stored refresh token for a new access token.
    pub async fn request_refresh_token(&self, ctx: &OpContext) -> Result<Response, Error> {
        let refresh_token = self.dispatcher.session().await.refresh_token().to_string();
        let names = self.dispatcher.header_names();
        let request = RequestDescriptor::post(self.endpoints.refresh.as_str())
            .with_header(names.refresh_token.as_str(), refresh_token);
        let resp = self.dispatcher.send(ctx, &request).await?;
        let resp = expect_success(resp, RecoveryStep::TokenRefresh)?;
        let access_token_len = self.dispatcher.session().await.access_token().len();
        info!(call_id = %ctx.id(), access_token_len, "token.refreshed");
        Ok(resp)
    }

    /// Anti-forgery probe followed by a refresh token exchange.
    pub async fn update_tokens(&self, ctx: &OpContext) -> Result<Response, Error> {
        self.update_csrf_token(ctx).await?;
        self.request_refresh_token(ctx).await
    }

    /// Ends the server session, then forgets local tokens and the stored refresh token.
    /// The logout request itself recovers like any other call.
    pub async fn logout(&self, ctx: &OpContext) -> Result<Response, Error> {
        let request = RequestDescriptor::post(self.endpoints.logout.as_str());
        let resp = self.send_with(ctx, &request).await?.into_result()?;
        self.dispatcher.update_session(SessionState::clear_tokens).await;
        self.credentials.save_refresh_token(ctx, "").await;
        info!(call_id = %ctx.id(), "logout.success");
        Ok(resp)
    }

    /// Resends `request` with an SMS confirmation code, echoing the SMS token
    /// from `previous` when the server issued one.
    pub async fn send_sms_confirmation(
        &self,
        ctx: &OpContext,
        previous: &Response,
        code: &str,
        request: &RequestDescriptor,
    ) -> Result<Response, Error> {
        let names = self.dispatcher.header_names();
        let mut confirmed = request.clone().with_header(names.sms_code.as_str(), code);
        if let Some(token) = previous.header(&names.sms_token).filter(|t| !t.is_empty()) {
            confirmed = confirmed.with_header(names.sms_token.as_str(), token);
        }
        self.send_with(ctx, &confirmed).await
    }
}

#[async_trait]
impl RecoveryHandler for RestApiClient {
    async fn resend(
        &self,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> Result<Response, Error> {
        self.dispatcher.send(ctx, request).await
    }

    async fn session(&self) -> SessionState {
        self.dispatcher.session().await
    }

    async fn refresh_csrf(&self, ctx: &OpContext) -> Result<Response, Error> {
        self.update_csrf_token(ctx).await
    }

    async fn credentials(&self, ctx: &OpContext) -> Result<Credentials, Error> {
        self.credentials.credentials(ctx).await
    }

    async fn login(&self, ctx: &OpContext, credentials: &Credentials) -> Result<Response, Error> {
        RestApiClient::login(self, ctx, credentials).await
    }

    async fn refresh_access_token(&self, ctx: &OpContext) -> Result<Response, Error> {
        self.request_refresh_token(ctx).await
    }

    async fn persist_refresh_token(&self, ctx: &OpContext) {
        let token = self.dispatcher.session().await.refresh_token().to_string();
        self.credentials.save_refresh_token(ctx, &token).await;
    }
}

fn expect_success(resp: Response, step: RecoveryStep) -> Result<Response, Error> {
    if resp.is_success() {
        Ok(resp)
    } else {
        Err(step_error(&resp, step))
    }
}

fn step_error(resp: &Response, step: RecoveryStep) -> Error {
    let error = resp.error().cloned().unwrap_or_else(|| {
        ApiError::new(
            "unexpected_response",
            format!("unexpected HTTP {} during {step}", resp.status()),
        )
    });
    Error::AuthRecovery {
        step,
        status: resp.status(),
        error,
    }
}
