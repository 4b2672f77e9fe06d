//! Outbound adapters implementing domain ports.
//!
//! - **backend**: reqwest transport to the backend API.
//!
//! Adapters translate between domain envelopes and the wire. They contain no
//! business logic.

pub mod backend;
