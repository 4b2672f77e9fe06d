//! Inbound adapters translating browser traffic into domain calls.
//!
//! HTTP pages, form actions and the route guard live under [`http`]; the OTP
//! verification socket lives under [`ws`].

pub mod http;
pub mod ws;
