//! Session adapter backed by the encrypted session cookie.
//!
//! [`SessionContext`] wraps the Actix session so handlers and the domain only
//! see [`SessionStore`] operations. The identity, token included, lives in a
//! private (signed and encrypted) cookie; nothing is kept server side.

use actix_session::{Session, SessionExt};
use actix_web::dev::{Payload, ServiceRequest};
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::ports::{SessionError, SessionStore};
use crate::domain::Identity;

pub(crate) const IDENTITY_KEY: &str = "identity";

/// Newtype wrapper that exposes the session as a [`SessionStore`].
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying Actix session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Session of a request still travelling through middleware.
    pub fn from_service_request(req: &ServiceRequest) -> Self {
        Self(req.get_session())
    }
}

impl SessionStore for SessionContext {
    fn create_session(&self, identity: &Identity) -> Result<(), SessionError> {
        // A fresh session key on sign-in prevents fixation.
        self.0.renew();
        self.0
            .insert(IDENTITY_KEY, identity)
            .map_err(|error| SessionError::persist(error.to_string()))
    }

    fn current_session(&self) -> Option<Identity> {
        match self.0.get::<Identity>(IDENTITY_KEY) {
            Ok(identity) => identity,
            Err(error) => {
                warn!(%error, "discarding unreadable identity in session cookie");
                None
            }
        }
    }

    fn destroy_session(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Error, TokenClaims, messages};
    use crate::inbound::http::test_utils::{SESSION_COOKIE, session_cookie, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, HttpResponse, test, web};

    fn identity() -> Identity {
        Identity::new(
            TokenClaims {
                id: "31".into(),
                email: "mai@example.vn".into(),
                role: "user".into(),
                exp: None,
            },
            "opaque.token.value",
            Some("2030-01-01T00:00:00Z".into()),
        )
    }

    fn session_app() -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .wrap(test_session_middleware())
            .route(
                "/set",
                web::get().to(|session: SessionContext| async move {
                    session
                        .create_session(&identity())
                        .map_err(|err| Error::internal(err.to_string()))?;
                    Ok::<_, Error>(HttpResponse::Ok())
                }),
            )
            .route(
                "/get",
                web::get().to(|session: SessionContext| async move {
                    let identity = session
                        .current_session()
                        .ok_or_else(|| Error::unauthorized(messages::LOGIN_REQUIRED))?;
                    Ok::<_, Error>(HttpResponse::Ok().body(identity.token().to_owned()))
                }),
            )
            .route(
                "/logout",
                web::get().to(|session: SessionContext| async move {
                    session.destroy_session();
                    HttpResponse::Ok()
                }),
            )
    }

    #[actix_web::test]
    async fn round_trips_identity_with_token_verbatim() {
        let app = test::init_service(session_app()).await;

        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        assert_eq!(set_res.status(), StatusCode::OK);
        let cookie = session_cookie(&set_res).expect("session cookie set");
        assert!(
            !cookie.value().contains("opaque.token.value"),
            "cookie content must be encrypted"
        );

        let get_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(get_res.status(), StatusCode::OK);
        assert_eq!(test::read_body(get_res).await, "opaque.token.value");
    }

    #[actix_web::test]
    async fn missing_identity_is_unauthorised() {
        let app = test::init_service(session_app()).await;
        let res =
            test::call_service(&app, test::TestRequest::get().uri("/get").to_request()).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn tampered_cookie_reads_as_no_session() {
        let app = test::init_service(session_app()).await;
        let forged = actix_web::cookie::Cookie::new(SESSION_COOKIE, "bm90LWEtcmVhbC1jb29raWU=");
        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(forged).to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn unreadable_identity_reads_as_no_session() {
        let app = test::init_service(
            App::new()
                .wrap(test_session_middleware())
                .route(
                    "/set-invalid",
                    web::get().to(|session: Session| async move {
                        session
                            .insert(IDENTITY_KEY, "not an identity")
                            .expect("set invalid identity");
                        HttpResponse::Ok()
                    }),
                )
                .route(
                    "/get",
                    web::get().to(|session: SessionContext| async move {
                        HttpResponse::Ok().body(session.current_session().is_some().to_string())
                    }),
                ),
        )
        .await;
        let set_res = test::call_service(
            &app,
            test::TestRequest::get().uri("/set-invalid").to_request(),
        )
        .await;
        let cookie = session_cookie(&set_res).expect("session cookie set");

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/get").cookie(cookie).to_request(),
        )
        .await;
        assert_eq!(test::read_body(res).await, "false");
    }

    #[actix_web::test]
    async fn destroy_session_clears_the_cookie() {
        let app = test::init_service(session_app()).await;
        let set_res =
            test::call_service(&app, test::TestRequest::get().uri("/set").to_request()).await;
        let cookie = session_cookie(&set_res).expect("session cookie set");

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/logout").cookie(cookie).to_request(),
        )
        .await;
        let removal = session_cookie(&res).expect("removal cookie");
        assert_eq!(removal.value(), "");
    }
}
