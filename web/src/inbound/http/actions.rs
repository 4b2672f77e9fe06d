//! Form actions posted by the pages.
//!
//! ```text
//! POST /actions/login               {"email","password"}
//! POST /actions/register            {"email","password","confirmPassword"}
//! POST /actions/verify-code         {"email","code"}
//! POST /actions/resend-verify-code  {"email"}
//! POST /actions/refresh-token
//! POST /actions/logout
//! ```
//!
//! Forms are validated before any backend call; invalid input answers `400`
//! with `details.fieldErrors`. Backend rejections are relayed with the
//! backend's field messages attributed to form fields where possible.

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::SessionStore;
use crate::domain::route_guard::DEFAULT_LOGIN_PATH;
use crate::domain::{
    ApiResult, Email, Error, FormErrors, FormField, GatewayResult, Identity, LoginCredentials,
    LoginOutcome, RefreshOutcome, RegisterForm, VerifyCodeForm, messages,
};

/// Login form body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Registration form body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// OTP verification form body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub email: String,
    pub code: String,
}

/// OTP resend request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResendCodeRequest {
    pub email: String,
}

/// Signed-in identity as shown to the browser; never carries the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IdentityView {
    pub id: String,
    pub email: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expire: Option<String>,
}

impl From<&Identity> for IdentityView {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id().to_owned(),
            email: identity.email().to_owned(),
            role: identity.role().to_owned(),
            expire: identity.expire().map(str::to_owned),
        }
    }
}

/// Login result.
///
/// `code`: 0 failed, 1 invalid credentials, 2 account not activated (the
/// OTP dialog opens for `email`), 3 signed in (`data` holds the identity).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub code: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<IdentityView>,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        let code = outcome.code();
        let mut response = Self {
            code,
            error: None,
            email: None,
            data: None,
        };
        match outcome {
            LoginOutcome::Failed { message } | LoginOutcome::InvalidCredentials { message } => {
                response.error = Some(message);
            }
            LoginOutcome::NotActivated { email } => response.email = Some(email.into()),
            LoginOutcome::Authenticated(identity) => {
                response.data = Some(IdentityView::from(&identity));
            }
        }
        response
    }
}

/// Confirmation shown after a successful action.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionMessage {
    pub message: String,
    /// Page the browser should open next.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl ActionMessage {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            redirect: None,
        }
    }
}

/// Register every action under the enclosing scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(login)
        .service(register)
        .service(verify_code)
        .service(resend_verify_code)
        .service(refresh_token)
        .service(logout);
}

/// Sign in and store the identity in the session cookie.
#[utoipa::path(
    post,
    path = "/actions/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login classified", body = LoginResponse,
            headers(("Set-Cookie" = String, description = "Session cookie when code is 3"))),
        (status = 400, description = "Invalid form", body = Error)
    ),
    tags = ["actions"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(validation_error)?;
    let outcome = state
        .authenticator
        .authenticate(&credentials, &session)
        .await;
    Ok(web::Json(outcome.into()))
}

/// Create an account; the backend mails an OTP on success.
#[utoipa::path(
    post,
    path = "/actions/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = ActionMessage),
        (status = 400, description = "Invalid form", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["actions"],
    operation_id = "register",
    security([])
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<web::Json<ActionMessage>> {
    let RegisterRequest {
        email,
        password,
        confirm_password,
    } = payload.into_inner();
    let form = RegisterForm::try_from_parts(&email, &password, &confirm_password)
        .map_err(validation_error)?;
    let result = state.client.register(&form).await;
    if !result.ok {
        return Err(relay_failure(&result, messages::REGISTER_FAILED));
    }
    Ok(web::Json(ActionMessage::new(
        result.message().unwrap_or(messages::REGISTER_SUCCEEDED),
    )))
}

/// Confirm an account with the mailed OTP.
#[utoipa::path(
    post,
    path = "/actions/verify-code",
    request_body = VerifyCodeRequest,
    responses(
        (status = 200, description = "Account activated", body = ActionMessage),
        (status = 400, description = "Invalid or wrong code", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["actions"],
    operation_id = "verifyCode",
    security([])
)]
#[post("/verify-code")]
pub async fn verify_code(
    state: web::Data<HttpState>,
    payload: web::Json<VerifyCodeRequest>,
) -> ApiResult<web::Json<ActionMessage>> {
    let VerifyCodeRequest { email, code } = payload.into_inner();
    let form = VerifyCodeForm::try_from_parts(&email, &code).map_err(validation_error)?;
    let result = state.client.verify_code(&form).await;
    if !result.ok {
        return Err(relay_failure(&result, messages::VERIFY_FAILED));
    }
    Ok(web::Json(ActionMessage {
        message: result
            .message()
            .unwrap_or(messages::VERIFY_SUCCEEDED)
            .to_owned(),
        redirect: Some(DEFAULT_LOGIN_PATH.to_owned()),
    }))
}

/// Mail a fresh OTP.
#[utoipa::path(
    post,
    path = "/actions/resend-verify-code",
    request_body = ResendCodeRequest,
    responses(
        (status = 200, description = "Code sent", body = ActionMessage),
        (status = 400, description = "Invalid email", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["actions"],
    operation_id = "resendVerifyCode",
    security([])
)]
#[post("/resend-verify-code")]
pub async fn resend_verify_code(
    state: web::Data<HttpState>,
    payload: web::Json<ResendCodeRequest>,
) -> ApiResult<web::Json<ActionMessage>> {
    let email = Email::parse(&payload.email).map_err(|message| {
        let mut errors = FormErrors::default();
        errors.add(FormField::Email, message);
        validation_error(errors)
    })?;
    let result = state.client.resend_verify_code(&email).await;
    if !result.ok {
        return Err(relay_failure(&result, messages::RESEND_FAILED));
    }
    Ok(web::Json(ActionMessage::new(
        result.message().unwrap_or(messages::RESEND_SUCCEEDED),
    )))
}

/// Swap the session token for a fresh one.
#[utoipa::path(
    post,
    path = "/actions/refresh-token",
    responses(
        (status = 200, description = "Session refreshed", body = IdentityView),
        (status = 401, description = "No session or token rejected", body = Error),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["actions"],
    operation_id = "refreshToken"
)]
#[post("/refresh-token")]
pub async fn refresh_token(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<IdentityView>> {
    match state.authenticator.refresh(&session).await {
        RefreshOutcome::Refreshed(identity) => Ok(web::Json(IdentityView::from(&identity))),
        RefreshOutcome::NoSession => Err(Error::unauthorized(messages::LOGIN_REQUIRED)),
        RefreshOutcome::Failed { status: 401, message } => {
            session.destroy_session();
            Err(Error::unauthorized(message))
        }
        RefreshOutcome::Failed { message, .. } => Err(Error::service_unavailable(message)),
    }
}

/// Forget the session and send the browser to the login page.
#[utoipa::path(
    post,
    path = "/actions/logout",
    responses((status = 303, description = "Signed out; redirect to the login page")),
    tags = ["actions"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.destroy_session();
    HttpResponse::SeeOther()
        .insert_header((LOCATION, DEFAULT_LOGIN_PATH))
        .finish()
}

fn validation_error(errors: FormErrors) -> Error {
    Error::invalid_request(messages::FORM_INVALID).with_details(json!({ "fieldErrors": errors }))
}

/// Translate a failed backend answer into an error the form can render.
fn relay_failure(result: &GatewayResult, fallback: &str) -> Error {
    let remote = result.remote_error();
    let message = remote.message().unwrap_or(fallback).to_owned();
    let (field_errors, mut form_errors) = remote.attribute();
    form_errors.retain(|entry| *entry != message);
    let error = match result.status {
        400 | 422 => Error::invalid_request(message),
        401 => Error::unauthorized(message),
        403 | 423 => Error::forbidden(message),
        404 => Error::not_found(message),
        409 => Error::conflict(message),
        _ => Error::service_unavailable(message),
    };
    error.with_details(json!({ "fieldErrors": field_errors, "formErrors": form_errors }))
}
