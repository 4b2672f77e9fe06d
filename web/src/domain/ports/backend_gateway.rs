//! Driven port for calls to the backend API.
//!
//! The backend is opaque: this port only moves JSON envelopes. Adapters must
//! fold every failure into a [`GatewayResult`] so callers branch on the
//! result instead of juggling transport errors.

use async_trait::async_trait;

use crate::domain::{GatewayRequest, GatewayResult};

/// Transport to the backend API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Issue `request` and report whatever came back.
    async fn call(&self, request: GatewayRequest) -> GatewayResult;
}
