use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::HeaderNames;
use crate::errors::Error;
use crate::request::RequestDescriptor;
use crate::request_context::OpContext;
use crate::response::Response;
use crate::session::SessionState;
use crate::transport::{Transport, TransportRequest};

/// Sends descriptors over the transport, injecting and capturing session tokens.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    session: RwLock<SessionState>,
    headers: HeaderNames,
}

impl Dispatcher {
    pub fn new(transport: Arc<dyn Transport>, session: SessionState, headers: HeaderNames) -> Self {
        Self {
            transport,
            session: RwLock::new(session),
            headers,
        }
    }

    pub fn header_names(&self) -> &HeaderNames {
        &self.headers
    }

    pub async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    pub async fn update_session<F>(&self, update: F)
    where
        F: FnOnce(&mut SessionState),
    {
        let mut session = self.session.write().await;
        update(&mut session);
    }

    /// Sends `request` once. Tokens found in the response headers are stored
    /// even when the response is a failure or its error body is malformed.
    pub async fn send(
        &self,
        ctx: &OpContext,
        request: &RequestDescriptor,
    ) -> Result<Response, Error> {
        ctx.ensure_active()?;
        let outbound = self.build(request).await?;
        debug!(
            call_id = %ctx.id(),
            method = %request.method,
            path = %request.path,
            "dispatch.send"
        );

        let reply = tokio::select! {
            biased;
            _ = ctx.cancellation().cancelled() => return Err(Error::Cancelled),
            reply = self.transport.send(outbound) => reply,
        };
        let reply = match reply {
            Ok(reply) => reply,
            Err(err) => {
                warn!(
                    call_id = %ctx.id(),
                    method = %request.method,
                    path = %request.path,
                    error = %err,
                    "dispatch.transport_failed"
                );
                return Err(err);
            }
        };

        let tokens_updated = self.session.write().await.capture(&self.headers, &reply.headers);
        let status = reply.status;
        let response = Response::from_parts(status, reply.headers, reply.body).map_err(|err| {
            warn!(
                call_id = %ctx.id(),
                path = %request.path,
                status,
                error = %err,
                "dispatch.error_body_unparseable"
            );
            err
        })?;
        debug!(
            call_id = %ctx.id(),
            path = %request.path,
            status = response.status(),
            code = response.error_code(),
            tokens_updated,
            "dispatch.response"
        );
        Ok(response)
    }

    async fn build(&self, request: &RequestDescriptor) -> Result<TransportRequest, Error> {
        let session = self.session.read().await;
        let mut url = session.url(&request.path);
        if let Some(query) = request.query_string()? {
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&query);
        }
        Ok(TransportRequest {
            method: request.method,
            url,
            headers: session.outbound_headers(&self.headers, &request.headers)?,
            body: request.json_body()?,
        })
    }
}
