//! Port for the per-browser session holding the caller's [`Identity`].
//!
//! The store is request-scoped: an adapter wraps whatever state the inbound
//! transport keeps for one browser. Reads never fail; an unreadable session
//! is simply absent.

use super::define_port_error;
use crate::domain::Identity;

define_port_error! {
    /// Errors raised while writing session state.
    pub enum SessionError {
        /// The identity could not be written into the session.
        Persist { message: String } => "failed to persist session: {message}",
    }
}

/// Request-scoped session storage.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore {
    /// Store `identity`, replacing any previous one.
    fn create_session(&self, identity: &Identity) -> Result<(), SessionError>;

    /// Identity held by the session, if any.
    fn current_session(&self) -> Option<Identity>;

    /// Forget the session entirely.
    fn destroy_session(&self);
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;

    #[test]
    fn persist_error_names_the_cause() {
        let err = SessionError::persist("cookie too large");
        assert_eq!(
            err.to_string(),
            "failed to persist session: cookie too large"
        );
    }
}
