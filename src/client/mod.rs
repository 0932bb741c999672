use std::sync::Arc;

use crate::config::Endpoints;
use crate::credentials::CredentialProvider;
use crate::dispatcher::Dispatcher;
use crate::proof::PasswordProof;
use crate::recovery::RecoveryController;

mod auth;
mod impls;

/// REST client that transparently recovers from anti-forgery, access token
/// and session failures before handing a result back to the caller.
pub struct RestApiClient {
    dispatcher: Dispatcher,
    credentials: Arc<dyn CredentialProvider>,
    proof: Arc<dyn PasswordProof>,
    endpoints: Endpoints,
    recovery: RecoveryController,
}
