//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod backend_gateway;
mod session_store;

pub use backend_gateway::BackendGateway;
#[cfg(test)]
pub use backend_gateway::MockBackendGateway;
#[cfg(test)]
pub use session_store::MockSessionStore;
pub use session_store::{SessionError, SessionStore};
