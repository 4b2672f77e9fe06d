//! WebSocket inbound adapter for the OTP verification dialog.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, query parameters)
//! - start the per-connection OTP session task
//! - keep WebSocket-specific concerns at the edge of the system

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use serde::Deserialize;
use tracing::{error, warn};
use url::Url;

use crate::domain::Email;

mod otp;

pub mod messages;
pub mod state;

use messages::OtpPurpose;
use state::WsState;

/// Query string of `/ws/otp`.
#[derive(Debug, Deserialize)]
pub struct OtpQuery {
    pub email: String,
    pub purpose: OtpPurpose,
}

/// Upgrade `/ws/otp?email=..&purpose=registration|activation`.
///
/// Opening the socket opens the dialog: activation resends a code straight
/// away, registration starts the resend cooldown.
#[get("/ws/otp")]
pub async fn otp_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    query: web::Query<OtpQuery>,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }
    validate_origin(origin_header, state.public_host.as_deref())?;

    let OtpQuery { email, purpose } = query.into_inner();
    let email = Email::parse(&email).map_err(actix_web::error::ErrorBadRequest)?;

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;
    actix_web::rt::spawn(otp::handle_otp_session(
        state.get_ref().clone(),
        email,
        purpose,
        session,
        messages,
    ));
    Ok(response)
}

fn validate_origin(origin_header: &HeaderValue, public_host: Option<&str>) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if is_allowed_origin(&origin, public_host) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}

const LOCALHOST: &str = "localhost";

/// Returns true when a parsed Origin belongs to the allow-list.
///
/// Accepts HTTP from localhost with a non-zero explicit port, and HTTPS from
/// the configured public host and its subdomains.
fn is_allowed_origin(origin: &Url, public_host: Option<&str>) -> bool {
    let Some(host) = origin.host_str() else {
        return false;
    };

    match (origin.scheme(), public_host) {
        ("http", _) if host == LOCALHOST => matches!(origin.port(), Some(port) if port != 0),
        ("https", Some(public)) if host == public => true,
        ("https", Some(public)) => host
            .strip_suffix(public)
            .is_some_and(|prefix| prefix.len() > 1 && prefix.ends_with('.')),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use rstest::rstest;

    const PUBLIC: Option<&str> = Some("threads.example");

    fn header(value: &str) -> HeaderValue {
        HeaderValue::from_str(value).expect("valid header value")
    }

    #[rstest]
    #[case("http://localhost:3000")]
    #[case("https://threads.example")]
    #[case("https://www.threads.example")]
    fn accepts_configured_origins(#[case] origin: &str) {
        assert!(validate_origin(&header(origin), PUBLIC).is_ok());
    }

    #[rstest]
    #[case("http://localhost")]
    #[case("https://example.com")]
    #[case("wss://threads.example")]
    fn rejects_disallowed_origins(#[case] origin: &str) {
        let error = validate_origin(&header(origin), PUBLIC).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn rejects_non_utf8_origin_header() {
        let header = HeaderValue::from_bytes(&[0x80]).expect("opaque header value");
        let error = validate_origin(&header, PUBLIC).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn rejects_unparsable_origin_header() {
        let header = HeaderValue::from_static("not a url");
        let error = validate_origin(&header, PUBLIC).expect_err("origin should be rejected");
        assert_eq!(
            error.as_response_error().status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[rstest]
    #[case("http://localhost:4000", PUBLIC, true)]
    #[case("http://localhost:0", PUBLIC, false)]
    #[case("https://threads.example", PUBLIC, true)]
    #[case("https://m.threads.example", PUBLIC, true)]
    #[case("https://evilthreads.example", PUBLIC, false)]
    #[case("https://threads.example.evil.com", PUBLIC, false)]
    #[case("https://threads.example", None, false)]
    #[case("http://localhost:4000", None, true)]
    fn evaluates_allow_list(
        #[case] origin: &str,
        #[case] public_host: Option<&str>,
        #[case] expected: bool,
    ) {
        let parsed = Url::parse(origin).expect("url should parse");
        assert_eq!(is_allowed_origin(&parsed, public_host), expected);
    }
}
