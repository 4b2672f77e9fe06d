//! Shared WebSocket adapter state.

use std::sync::Arc;
use std::sync::atomic::AtomicUsize;

use crate::domain::{BackendClient, RESEND_COOLDOWN_SECS};

/// Dependency bundle for the OTP socket.
#[derive(Clone)]
pub struct WsState {
    pub client: BackendClient,
    /// Public host whose HTTPS origin (and subdomains) may open sockets.
    pub public_host: Option<String>,
    pub cooldown_secs: u32,
    /// Resend tickers alive across every open socket.
    pub live_tickers: Arc<AtomicUsize>,
}

impl WsState {
    pub fn new(client: BackendClient, public_host: Option<String>) -> Self {
        Self {
            client,
            public_host,
            cooldown_secs: RESEND_COOLDOWN_SECS,
            live_tickers: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Override the resend cooldown length.
    #[must_use]
    pub fn with_cooldown_secs(mut self, cooldown_secs: u32) -> Self {
        self.cooldown_secs = cooldown_secs;
        self
    }
}
