use async_trait::async_trait;
use tokio::time::Instant;

use crate::config::ErrorCodes;
use crate::credentials::Credentials;
use crate::errors::Error;
use crate::request::RequestDescriptor;
use crate::request_context::OpContext;
use crate::response::Response;
use crate::session::SessionState;
use crate::telemetry::RecoveryTelemetry;

use super::budget::RecoveryBudget;
use super::{RecoveryAction, RecoveryLimits, RecoveryOutcome};

/// Session-level primitives the controller drives. Every method that talks
/// to the server goes through the dispatcher, so tokens in response headers
/// are already captured when it returns.
#[async_trait]
pub trait RecoveryHandler: Send + Sync {
    /// Sends `request` once, without recovery.
    async fn resend(&self, ctx: &OpContext, request: &RequestDescriptor) -> Result<Response, Error>;

    async fn session(&self) -> SessionState;

    /// Status probe that yields a fresh anti-forgery token.
    async fn refresh_csrf(&self, ctx: &OpContext) -> Result<Response, Error>;

    async fn credentials(&self, ctx: &OpContext) -> Result<Credentials, Error>;

    /// Two-step salted login.
    async fn login(&self, ctx: &OpContext, credentials: &Credentials) -> Result<Response, Error>;

    /// Exchanges the refresh token for a new access token.
    async fn refresh_access_token(&self, ctx: &OpContext) -> Result<Response, Error>;

    /// Hands the current refresh token to the credential provider.
    async fn persist_refresh_token(&self, ctx: &OpContext);
}

/// Failure-driven retry loop around one request descriptor.
#[derive(Clone, Debug)]
pub struct RecoveryController {
    limits: RecoveryLimits,
    codes: ErrorCodes,
}

impl RecoveryController {
    pub fn new(limits: RecoveryLimits, codes: ErrorCodes) -> Self {
        Self { limits, codes }
    }

    pub fn limits(&self) -> &RecoveryLimits {
        &self.limits
    }

    pub fn codes(&self) -> &ErrorCodes {
        &self.codes
    }

    /// Sends `request` and keeps recovering until the result needs no action,
    /// a handshake fails, or a failure class runs out of attempts.
    pub async fn execute<H>(
        &self,
        handler: &H,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> (Result<Response, Error>, RecoveryOutcome)
    where
        H: RecoveryHandler + ?Sized,
    {
        let start = Instant::now();
        let telemetry =
            RecoveryTelemetry::new(ctx.id(), format!("{} {}", request.method, request.path));
        let mut budget = RecoveryBudget::new(self.limits.clone());
        let mut actions = Vec::new();
        let mut requests_sent: u8 = 1;

        let mut result = handler.resend(ctx, request).await;
        let result = loop {
            let (action, status, code) = match &result {
                Ok(response) => {
                    let session = handler.session().await;
                    (
                        RecoveryAction::select(response, &session, &self.codes),
                        response.status(),
                        response.error_code().to_string(),
                    )
                }
                Err(_) => (RecoveryAction::None, 0, String::new()),
            };
            if action == RecoveryAction::None {
                break result;
            }

            let attempt = match budget.try_consume(action) {
                Ok(attempt) => attempt,
                Err(err) => {
                    telemetry.emit_exhausted(action, self.limits.limit_for(action));
                    break Err(err);
                }
            };
            telemetry.emit_start(action, attempt, status, &code);
            actions.push(action);

            if let Err(err) = self.recover(handler, ctx, action, &telemetry).await {
                telemetry.emit_failure(action, &err);
                break Err(err);
            }
            telemetry.emit_success(action);

            if let Err(err) = ctx.ensure_active() {
                break Err(err);
            }
            requests_sent = requests_sent.saturating_add(1);
            result = handler.resend(ctx, request).await;
        };

        let outcome = RecoveryOutcome {
            call_id: telemetry.call_id(),
            operation: telemetry.operation().to_string(),
            actions,
            requests_sent,
            success: matches!(&result, Ok(response) if response.is_success()),
            total_elapsed: start.elapsed(),
        };
        outcome.log();
        (result, outcome)
    }

    async fn recover<H>(
        &self,
        handler: &H,
        ctx: &OpContext,
        action: RecoveryAction,
        telemetry: &RecoveryTelemetry,
    ) -> Result<(), Error>
    where
        H: RecoveryHandler + ?Sized,
    {
        match action {
            RecoveryAction::None => {}
            RecoveryAction::RefreshCsrf => {
                ctx.ensure_active()?;
                handler.refresh_csrf(ctx).await?;
            }
            RecoveryAction::Login => {
                ctx.ensure_active()?;
                let credentials = handler
                    .credentials(ctx)
                    .await
                    .map_err(credentials_unavailable)?;

                ctx.ensure_active()?;
                match handler.refresh_csrf(ctx).await {
                    Ok(_) => {}
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(err) => telemetry.emit_skipped("csrf_probe", &err),
                }

                ctx.ensure_active()?;
                handler.login(ctx, &credentials).await?;
                drop(credentials);
                handler.persist_refresh_token(ctx).await;
            }
            RecoveryAction::RefreshToken => {
                ctx.ensure_active()?;
                handler.refresh_access_token(ctx).await?;
                handler.persist_refresh_token(ctx).await;
            }
        }
        Ok(())
    }
}

fn credentials_unavailable(err: Error) -> Error {
    match err {
        Error::CredentialsUnavailable(_) | Error::Cancelled => err,
        other => Error::CredentialsUnavailable(other.to_string()),
    }
}
