//! Typed access to the backend API endpoints.
//!
//! Two call modes exist. Public calls never carry a bearer token.
//! Authenticated calls take the token from the caller's session and
//! short-circuit with [`GatewayResult::no_session`] when there is none, so an
//! anonymous request never reaches the network.

use std::sync::Arc;

use serde_json::json;

use super::forms::{Email, LoginCredentials, RegisterForm, VerifyCodeForm};
use super::gateway::{GatewayRequest, GatewayResult};
use super::ports::{BackendGateway, SessionStore};

/// Relative paths of the backend endpoints this server relays to.
pub mod paths {
    pub const REGISTER: &str = "/api/v1/register";
    pub const VERIFY_CODE: &str = "/api/v1/verify-code";
    pub const RESEND_VERIFY_CODE: &str = "/api/v1/resend-verify-code";
    pub const LOGIN: &str = "/api/v1/login";
    pub const PROFILE: &str = "/api/v1/profile";
    pub const REFRESH_TOKEN: &str = "/api/v1/refresh-token";
}

/// Facade over a [`BackendGateway`] exposing the backend's endpoints.
#[derive(Clone)]
pub struct BackendClient {
    gateway: Arc<dyn BackendGateway>,
}

impl BackendClient {
    pub fn new(gateway: Arc<dyn BackendGateway>) -> Self {
        Self { gateway }
    }

    /// Issue `request` without credentials.
    pub async fn public(&self, mut request: GatewayRequest) -> GatewayResult {
        request.bearer = None;
        self.gateway.call(request).await
    }

    /// Issue `request` with the session's token as bearer.
    pub async fn authenticated(
        &self,
        session: &dyn SessionStore,
        request: GatewayRequest,
    ) -> GatewayResult {
        let Some(identity) = session.current_session() else {
            return GatewayResult::no_session();
        };
        self.gateway
            .call(request.with_bearer(identity.token()))
            .await
    }

    pub async fn register(&self, form: &RegisterForm) -> GatewayResult {
        self.public(GatewayRequest::post(paths::REGISTER).with_body(form.to_backend_body()))
            .await
    }

    pub async fn verify_code(&self, form: &VerifyCodeForm) -> GatewayResult {
        self.public(GatewayRequest::post(paths::VERIFY_CODE).with_body(form.to_backend_body()))
            .await
    }

    pub async fn resend_verify_code(&self, email: &Email) -> GatewayResult {
        self.public(
            GatewayRequest::post(paths::RESEND_VERIFY_CODE)
                .with_body(json!({ "email": email.as_str() })),
        )
        .await
    }

    pub async fn login(&self, credentials: &LoginCredentials) -> GatewayResult {
        self.public(GatewayRequest::post(paths::LOGIN).with_body(credentials.to_backend_body()))
            .await
    }

    pub async fn profile(&self, session: &dyn SessionStore) -> GatewayResult {
        self.authenticated(session, GatewayRequest::get(paths::PROFILE))
            .await
    }

    pub async fn refresh_token(&self, session: &dyn SessionStore) -> GatewayResult {
        self.authenticated(session, GatewayRequest::get(paths::REFRESH_TOKEN))
            .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{MockBackendGateway, MockSessionStore};
    use crate::domain::{GatewayMethod, Identity, TokenClaims};
    use serde_json::Value;

    fn identity() -> Identity {
        Identity::new(
            TokenClaims {
                id: "7".into(),
                email: "an@example.vn".into(),
                role: "user".into(),
                exp: None,
            },
            "header.payload.sig",
            None,
        )
    }

    #[tokio::test]
    async fn authenticated_call_without_session_never_hits_the_gateway() {
        let mut gateway = MockBackendGateway::new();
        gateway.expect_call().never();
        let mut session = MockSessionStore::new();
        session.expect_current_session().returning(|| None);

        let client = BackendClient::new(Arc::new(gateway));
        let result = client.profile(&session).await;

        assert_eq!(result, GatewayResult::no_session());
    }

    #[tokio::test]
    async fn authenticated_call_sends_the_session_token() {
        let mut gateway = MockBackendGateway::new();
        gateway
            .expect_call()
            .withf(|request| {
                request.path == paths::PROFILE
                    && request.method == GatewayMethod::Get
                    && request.bearer.as_deref() == Some("header.payload.sig")
            })
            .times(1)
            .returning(|_| GatewayResult::from_response(200, json!({ "bio": "hi" })));
        let mut session = MockSessionStore::new();
        session
            .expect_current_session()
            .returning(|| Some(identity()));

        let client = BackendClient::new(Arc::new(gateway));
        let result = client.profile(&session).await;

        assert!(result.ok);
    }

    #[tokio::test]
    async fn public_calls_strip_any_bearer() {
        let mut gateway = MockBackendGateway::new();
        gateway
            .expect_call()
            .withf(|request| request.bearer.is_none())
            .times(1)
            .returning(|_| GatewayResult::from_response(200, Value::Null));

        let client = BackendClient::new(Arc::new(gateway));
        let result = client
            .public(GatewayRequest::get("/api/v1/threads").with_bearer("leaked"))
            .await;

        assert!(result.ok);
    }

    #[tokio::test]
    async fn resend_posts_the_email() {
        let mut gateway = MockBackendGateway::new();
        gateway
            .expect_call()
            .withf(|request| {
                request.path == paths::RESEND_VERIFY_CODE
                    && request.body == Some(json!({ "email": "an@example.vn" }))
            })
            .times(1)
            .returning(|_| GatewayResult::from_response(200, json!({ "message": "ok" })));

        let client = BackendClient::new(Arc::new(gateway));
        let email = Email::parse("an@example.vn").expect("email");
        assert!(client.resend_verify_code(&email).await.ok);
    }
}
