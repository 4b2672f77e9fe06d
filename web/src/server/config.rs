//! Startup configuration loaded via OrthoConfig.
//!
//! `BACKEND_API_URL` is required; a missing or malformed value stops the
//! process before the listener binds. Everything else has a default.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::sync::Arc;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::ports::BackendGateway;
use crate::inbound::http::session_config::SessionSettings;
use crate::outbound::backend::{BackendBaseUrl, BackendBaseUrlError};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const PROGRAM_NAME: &str = "threads-web";

/// Location of the backend API.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "BACKEND")]
pub struct BackendSettings {
    /// Base URL every backend path is resolved against.
    pub api_url: Option<String>,
}

impl BackendSettings {
    /// Load from configuration files and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a source cannot be read.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|error| SettingsError::Load {
            message: error.to_string(),
        })
    }

    /// Validated base URL.
    ///
    /// # Errors
    ///
    /// Fails when the URL is missing, unparsable, or not `http(s)`.
    pub fn base_url(&self) -> Result<BackendBaseUrl, SettingsError> {
        let raw = self
            .api_url
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(SettingsError::MissingBackendUrl)?;
        Ok(BackendBaseUrl::parse(raw)?)
    }
}

/// Listener settings.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "THREADS")]
pub struct ServerSettings {
    /// Socket address to bind, `0.0.0.0:3000` when unset.
    pub bind_addr: Option<String>,
    /// Public host allowed to open the OTP socket over HTTPS.
    pub public_host: Option<String>,
}

impl ServerSettings {
    /// Load from configuration files and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a source cannot be read.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::load_from_iter([OsString::from(PROGRAM_NAME)]).map_err(|error| SettingsError::Load {
            message: error.to_string(),
        })
    }

    /// Parsed bind address, falling back to the default.
    ///
    /// # Errors
    ///
    /// Fails when the configured value is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
            source,
        })
    }
}

/// Errors raised while assembling startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load configuration: {message}")]
    Load { message: String },
    #[error("BACKEND_API_URL must be set")]
    MissingBackendUrl,
    #[error(transparent)]
    InvalidBackendUrl(#[from] BackendBaseUrlError),
    #[error("invalid bind address `{value}`: {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

/// Everything [`super::create_server`] needs.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) gateway: Arc<dyn BackendGateway>,
    pub(crate) public_host: Option<String>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(
        session: SessionSettings,
        bind_addr: SocketAddr,
        gateway: Arc<dyn BackendGateway>,
    ) -> Self {
        Self {
            session,
            bind_addr,
            gateway,
            public_host: None,
        }
    }

    /// Allow HTTPS sockets from `host` and its subdomains.
    #[must_use]
    pub fn with_public_host(mut self, host: Option<String>) -> Self {
        self.public_host = host;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
