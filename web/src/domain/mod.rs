//! Domain primitives, services and ports.
//!
//! Nothing here knows about HTTP or cookies. Inbound adapters hand validated
//! forms and a [`ports::SessionStore`] to the services; outbound adapters
//! implement [`ports::BackendGateway`].
//!
//! Public surface:
//! - Error / ErrorCode - transport-agnostic error payload.
//! - Forms (`LoginCredentials`, `RegisterForm`, `VerifyCodeForm`) - inputs
//!   validated before any backend call.
//! - Gateway envelopes (`GatewayRequest`, `GatewayResult`, `RemoteError`).
//! - `Identity` - the signed-in caller kept in the session.
//! - `Authenticator`, `BackendClient`, `RouteTable`, `ResendCooldown`.

pub mod authenticator;
pub mod backend_client;
pub mod cooldown;
pub mod error;
pub mod feed;
pub mod forms;
pub mod gateway;
pub mod identity;
pub mod messages;
pub mod ports;
pub mod route_guard;

pub use self::authenticator::{Authenticator, LoginOutcome, RefreshOutcome};
pub use self::backend_client::BackendClient;
pub use self::cooldown::{RESEND_COOLDOWN_SECS, ResendCooldown};
pub use self::error::{Error, ErrorCode};
pub use self::feed::{ThreadAuthor, ThreadPost, compact_count, sample_feed};
pub use self::forms::{
    Email, FormErrors, FormField, LoginCredentials, OtpCode, RegisterForm, VerifyCodeForm,
};
pub use self::gateway::{
    GatewayMethod, GatewayRequest, GatewayResult, RemoteError, RemoteFieldError,
};
pub use self::identity::{Identity, TokenClaims, TokenDecodeError, decode_unverified_claims};
pub use self::route_guard::{GuardDecision, PathFilter, RouteTable};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use threads_web::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
