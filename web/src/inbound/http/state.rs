//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data` so they only depend
//! on domain services and remain testable with a mocked gateway.

use std::sync::Arc;

use crate::domain::ports::BackendGateway;
use crate::domain::{Authenticator, BackendClient, RESEND_COOLDOWN_SECS};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub client: BackendClient,
    pub authenticator: Authenticator,
    /// Seconds advertised to forms as the OTP resend cooldown.
    pub resend_cooldown_secs: u32,
}

impl HttpState {
    /// Wire every service to the same gateway.
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        let client = BackendClient::new(gateway);
        Self {
            authenticator: Authenticator::new(client.clone()),
            client,
            resend_cooldown_secs: RESEND_COOLDOWN_SECS,
        }
    }
}
