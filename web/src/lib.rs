//! Server-side front end for the Threads clone.
//!
//! The crate owns what the browser cannot be trusted with: the session cookie
//! holding the backend token, the route guard deciding which pages need a
//! session, the form actions relayed to the backend API, and the OTP
//! verification surface. Everything else is forwarded to the backend.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

pub use middleware::Trace;
pub use middleware::trace::TraceId;
