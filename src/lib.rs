//! REST API client that recovers from authentication failures on its own.
//!
//! Every request goes through a [`Dispatcher`] that injects the session's
//! access and anti-forgery tokens and captures new ones from response
//! headers. A [`RecoveryController`] inspects each result and, on a stale
//! anti-forgery token, an expired access token or a lost session, runs the
//! matching handshake before resending the original [`RequestDescriptor`].

mod client;
mod config;
mod credentials;
mod dispatcher;
mod errors;
mod proof;
mod recovery;
mod request;
mod request_context;
mod response;
mod session;
mod telemetry;
mod transport;

pub use client::RestApiClient;
pub use config::{ClientConfig, ConfigLocation, Endpoints, ErrorCodes, HeaderNames};
pub use credentials::{CredentialProvider, Credentials, InMemoryCredentials};
pub use dispatcher::Dispatcher;
pub use errors::{Error, ErrorKind};
pub use proof::{HmacSha256Proof, PasswordProof};
pub use recovery::{
    RecoveryAction, RecoveryController, RecoveryHandler, RecoveryLimits, RecoveryOutcome,
    RecoveryStep,
};
pub use request::{HttpMethod, RequestDescriptor};
pub use request_context::OpContext;
pub use response::{ApiError, Response, ResponseStatus};
pub use session::SessionState;
pub use transport::{ReqwestTransport, Transport, TransportRequest, TransportResponse};

pub use secrecy::SecretString;
pub use tokio_util::sync::CancellationToken;
