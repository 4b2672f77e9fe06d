//! HTTP inbound adapter: pages, form actions, probes and the route guard.

pub mod actions;
pub mod error;
pub mod guard;
pub mod health;
pub mod pages;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;

pub use error::ApiResult;
