//! Page view models.
//!
//! Each page answers JSON describing what the browser renders. Pages sit
//! behind the route guard, so `/profile` only runs for signed-in callers; it
//! still copes with a session the backend no longer honours.

use actix_web::http::header::LOCATION;
use actix_web::{HttpResponse, get, web};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::actions::IdentityView;
use super::session::SessionContext;
use super::state::HttpState;
use crate::domain::ports::SessionStore;
use crate::domain::route_guard::DEFAULT_LOGIN_PATH;
use crate::domain::{ApiResult, Error, FormField, ThreadPost, messages, sample_feed};

/// Home feed.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    /// Signed-in caller, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer: Option<IdentityView>,
    pub threads: Vec<ThreadPost>,
}

/// Descriptor of the login or register form.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormPage {
    /// Endpoint the form posts to.
    pub action: String,
    /// Field keys, in display order.
    pub fields: Vec<String>,
    /// Seconds between OTP resends in the verification dialog.
    pub otp_cooldown_secs: u32,
    /// Socket path opening the verification dialog.
    pub otp_socket: String,
}

impl FormPage {
    fn new(action: &str, fields: &[FormField], otp_cooldown_secs: u32) -> Self {
        Self {
            action: action.to_owned(),
            fields: fields.iter().map(|field| field.as_str().to_owned()).collect(),
            otp_cooldown_secs,
            otp_socket: "/ws/otp".to_owned(),
        }
    }
}

/// Profile of the signed-in caller.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePage {
    pub identity: IdentityView,
    /// Profile payload as returned by the backend.
    #[schema(value_type = Object)]
    pub profile: Value,
}

/// Register every page.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(home)
        .service(login_page)
        .service(register_page)
        .service(profile);
}

/// Home feed with the viewer, if signed in.
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Home feed", body = HomePage)),
    tags = ["pages"],
    operation_id = "homePage",
    security([])
)]
#[get("/")]
pub async fn home(session: SessionContext) -> web::Json<HomePage> {
    web::Json(HomePage {
        viewer: session.current_session().as_ref().map(IdentityView::from),
        threads: sample_feed(),
    })
}

/// Login form descriptor.
#[utoipa::path(
    get,
    path = "/login",
    responses(
        (status = 200, description = "Login form", body = FormPage),
        (status = 302, description = "Already signed in; redirect home")
    ),
    tags = ["pages"],
    operation_id = "loginPage",
    security([])
)]
#[get("/login")]
pub async fn login_page(state: web::Data<HttpState>) -> web::Json<FormPage> {
    web::Json(FormPage::new(
        "/actions/login",
        &[FormField::Email, FormField::Password],
        state.resend_cooldown_secs,
    ))
}

/// Registration form descriptor.
#[utoipa::path(
    get,
    path = "/register",
    responses((status = 200, description = "Register form", body = FormPage)),
    tags = ["pages"],
    operation_id = "registerPage",
    security([])
)]
#[get("/register")]
pub async fn register_page(state: web::Data<HttpState>) -> web::Json<FormPage> {
    web::Json(FormPage::new(
        "/actions/register",
        &[
            FormField::Email,
            FormField::Password,
            FormField::ConfirmPassword,
        ],
        state.resend_cooldown_secs,
    ))
}

/// Backend profile merged with the session identity.
///
/// A `401` from the backend means the stored token is dead: the session is
/// purged and the browser is sent to the login page.
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Profile", body = ProfilePage),
        (status = 302, description = "Session missing or rejected; redirect to login"),
        (status = 503, description = "Backend unavailable", body = Error)
    ),
    tags = ["pages"],
    operation_id = "profilePage"
)]
#[get("/profile")]
pub async fn profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let Some(identity) = session.current_session() else {
        return Ok(to_login());
    };
    let result = state.client.profile(&session).await;
    if result.ok {
        return Ok(HttpResponse::Ok().json(ProfilePage {
            identity: IdentityView::from(&identity),
            profile: result.data,
        }));
    }
    if result.status == 401 {
        info!(user_id = identity.id(), "backend rejected session token; signing out");
        session.destroy_session();
        return Ok(to_login());
    }
    warn!(status = result.status, "profile lookup failed");
    Err(Error::service_unavailable(
        result.message().unwrap_or(messages::PROFILE_FAILED),
    ))
}

fn to_login() -> HttpResponse {
    HttpResponse::Found()
        .insert_header((LOCATION, DEFAULT_LOGIN_PATH))
        .finish()
}
