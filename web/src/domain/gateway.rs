//! Request and result envelopes exchanged with the backend API.
//!
//! [`GatewayResult`] is the single shape every backend call resolves to. A
//! call never fails with `Err`: transport problems are folded into a
//! `status: 500` result carrying a readable message, so callers only ever
//! branch on `ok` and `status`.

use serde::Deserialize;
use serde_json::{Value, json};

use super::forms::{FormErrors, FormField};
use super::messages;

/// HTTP verbs the backend API understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl GatewayMethod {
    /// Upper-case verb as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One call to the backend API.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use threads_web::domain::{GatewayMethod, GatewayRequest};
///
/// let request = GatewayRequest::post("/api/v1/login")
///     .with_body(json!({ "email": "a@b.io" }))
///     .with_header("accept-language", "vi");
/// assert_eq!(request.method, GatewayMethod::Post);
/// assert!(request.bearer.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    /// Path relative to the configured base address.
    pub path: String,
    pub method: GatewayMethod,
    pub body: Option<Value>,
    /// Token sent as `Authorization: Bearer`.
    pub bearer: Option<String>,
    /// Extra headers applied last; they override the defaults.
    pub headers: Vec<(String, String)>,
}

impl GatewayRequest {
    /// Build a request with no body, bearer, or extra headers.
    pub fn new(method: GatewayMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            body: None,
            bearer: None,
            headers: Vec::new(),
        }
    }

    /// Shorthand for a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(GatewayMethod::Get, path)
    }

    /// Shorthand for a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(GatewayMethod::Post, path)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach a bearer token.
    #[must_use]
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Append a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// Outcome of one backend call.
///
/// ## Invariants
/// - `ok` is true exactly when `status` is in `200..=299`.
/// - A transport failure is `{ ok: false, status: 500, data: { message } }`
///   with a non-empty message.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayResult {
    pub ok: bool,
    pub status: u16,
    pub data: Value,
}

impl GatewayResult {
    /// Wrap a decoded backend response.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use threads_web::domain::GatewayResult;
    ///
    /// assert!(GatewayResult::from_response(204, json!(null)).ok);
    /// assert!(!GatewayResult::from_response(423, json!({})).ok);
    /// ```
    pub fn from_response(status: u16, data: Value) -> Self {
        Self {
            ok: (200..=299).contains(&status),
            status,
            data,
        }
    }

    /// Result reported when the backend could not be reached or decoded.
    pub fn transport_failure() -> Self {
        Self {
            ok: false,
            status: 500,
            data: json!({ "message": messages::BACKEND_UNREACHABLE }),
        }
    }

    /// Result reported for an authenticated call made without a session.
    pub fn no_session() -> Self {
        Self {
            ok: false,
            status: 401,
            data: json!({ "message": messages::NO_SESSION_TOKEN }),
        }
    }

    /// `data.message` when the backend supplied one.
    pub fn message(&self) -> Option<&str> {
        self.data
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.is_empty())
    }

    /// Backend-reported sub-code, falling back to the HTTP status.
    pub fn code(&self) -> u16 {
        self.data
            .get("code")
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
            .unwrap_or(self.status)
    }

    /// Interpret `data` as a backend error payload.
    pub fn remote_error(&self) -> RemoteError {
        RemoteError::from_result(self)
    }
}

/// One field-scoped problem reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RemoteFieldError {
    pub field: String,
    pub message: String,
}

/// Error payload returned by the backend on a non-2xx answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// The payload carried an `errors` array.
    Fielded {
        code: u16,
        message: Option<String>,
        errors: Vec<RemoteFieldError>,
    },
    /// Anything else; `message` is absent when the payload had none.
    Simple { code: u16, message: Option<String> },
}

impl RemoteError {
    fn from_result(result: &GatewayResult) -> Self {
        let code = result.code();
        let message = result.message().map(str::to_owned);
        match result.data.get("errors").and_then(Value::as_array) {
            Some(items) => Self::Fielded {
                code,
                message,
                errors: items
                    .iter()
                    .filter_map(|item| RemoteFieldError::deserialize(item).ok())
                    .collect(),
            },
            None => Self::Simple { code, message },
        }
    }

    /// Sub-code reported by the backend.
    pub fn code(&self) -> u16 {
        match self {
            Self::Fielded { code, .. } | Self::Simple { code, .. } => *code,
        }
    }

    /// Top-level message, if the backend sent one.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Fielded { message, .. } | Self::Simple { message, .. } => message.as_deref(),
        }
    }

    /// Split into field-scoped messages and form-level messages.
    ///
    /// Field names the form does not know about are kept as form-level
    /// messages so nothing the backend said is lost.
    pub fn attribute(&self) -> (FormErrors, Vec<String>) {
        let mut field_errors = FormErrors::default();
        let mut form_errors = Vec::new();
        match self {
            Self::Fielded { errors, .. } => {
                for error in errors {
                    match FormField::from_remote(&error.field) {
                        Some(field) => field_errors.add(field, error.message.clone()),
                        None => form_errors.push(error.message.clone()),
                    }
                }
                if field_errors.is_empty() && form_errors.is_empty() {
                    form_errors.extend(self.message().map(str::to_owned));
                }
            }
            Self::Simple { message, .. } => form_errors.extend(message.clone()),
        }
        (field_errors, form_errors)
    }
}
