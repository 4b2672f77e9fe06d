//! Backend API adapter.

mod http_gateway;

pub use http_gateway::ReqwestBackendGateway;

use std::fmt;

use url::Url;

/// Reasons a backend base address is rejected at startup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendBaseUrlError {
    /// Not an absolute URL.
    #[error("invalid backend API URL `{value}`: {message}")]
    Invalid { value: String, message: String },
    /// Scheme other than `http` or `https`.
    #[error("backend API URL must use http or https, got `{scheme}`")]
    UnsupportedScheme { scheme: String },
}

/// Absolute `http(s)` address every backend path is resolved against.
///
/// # Examples
/// ```
/// use threads_web::outbound::backend::BackendBaseUrl;
///
/// let base = BackendBaseUrl::parse("http://api.internal:8080/").expect("base url");
/// let url = base.resolve("/api/v1/login").expect("joined");
/// assert_eq!(url.as_str(), "http://api.internal:8080/api/v1/login");
/// assert!(BackendBaseUrl::parse("ftp://api.internal").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendBaseUrl(Url);

impl BackendBaseUrl {
    /// Validate `raw` as an absolute `http(s)` URL.
    pub fn parse(raw: &str) -> Result<Self, BackendBaseUrlError> {
        let url = Url::parse(raw.trim()).map_err(|err| BackendBaseUrlError::Invalid {
            value: raw.to_owned(),
            message: err.to_string(),
        })?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            other => Err(BackendBaseUrlError::UnsupportedScheme {
                scheme: other.to_owned(),
            }),
        }
    }

    /// Append `path` to the base, keeping any path prefix the base carries.
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = self.0.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }
}

impl fmt::Display for BackendBaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
