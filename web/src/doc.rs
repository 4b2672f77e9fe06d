//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] collects the pages, form actions and probes together with the
//! session cookie security scheme. Swagger UI serves it in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, ThreadAuthor, ThreadPost};
use crate::inbound::http::actions::{
    ActionMessage, IdentityView, LoginRequest, LoginResponse, RegisterRequest,
    ResendCodeRequest, VerifyCodeRequest,
};
use crate::inbound::http::pages::{FormPage, HomePage, ProfilePage};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Encrypted session cookie issued by POST /actions/login.",
            ))),
        );
    }
}

/// OpenAPI document for the web server's HTTP surface.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Threads web server",
        description = "Pages, form actions and probes served in front of the backend API."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::pages::home,
        crate::inbound::http::pages::login_page,
        crate::inbound::http::pages::register_page,
        crate::inbound::http::pages::profile,
        crate::inbound::http::actions::login,
        crate::inbound::http::actions::register,
        crate::inbound::http::actions::verify_code,
        crate::inbound::http::actions::resend_verify_code,
        crate::inbound::http::actions::refresh_token,
        crate::inbound::http::actions::logout,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        ThreadAuthor,
        ThreadPost,
        HomePage,
        FormPage,
        ProfilePage,
        IdentityView,
        LoginRequest,
        LoginResponse,
        RegisterRequest,
        VerifyCodeRequest,
        ResendCodeRequest,
        ActionMessage,
    )),
    tags(
        (name = "pages", description = "Page view models"),
        (name = "actions", description = "Form actions relayed to the backend"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/actions/login")]
    #[case("/actions/register")]
    #[case("/actions/logout")]
    #[case("/profile")]
    #[case("/health/ready")]
    fn documents_path(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "{path} missing");
    }

    #[test]
    fn registers_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
        assert!(components.schemas.contains_key("LoginResponse"));
    }
}
