//! Server construction and middleware wiring.
//!
//! Middleware order, outermost first: request tracing, the session cookie,
//! then the route guard, which reads the session.

mod config;

pub use config::{BackendSettings, ServerConfig, ServerSettings, SettingsError};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::body::MessageBody;
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use std::sync::Arc;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::domain::ports::BackendGateway;
use crate::inbound::http::guard::RouteGuard;
use crate::inbound::http::health::{HealthState, live, ready};
use crate::inbound::http::session_config::SessionSettings;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{actions, pages};
use crate::inbound::ws;
use crate::inbound::ws::state::WsState;

/// Name of the session cookie.
pub const SESSION_COOKIE_NAME: &str = "session";

/// Shared state and cookie settings for one application instance.
#[derive(Clone)]
pub struct AppDependencies {
    pub health_state: web::Data<HealthState>,
    pub http_state: web::Data<HttpState>,
    pub ws_state: web::Data<WsState>,
    pub session: SessionSettings,
}

impl AppDependencies {
    /// Wire every service to `gateway`.
    pub fn new(
        gateway: Arc<dyn BackendGateway>,
        session: SessionSettings,
        public_host: Option<String>,
    ) -> Self {
        let http_state = HttpState::new(gateway);
        let ws_state = WsState::new(http_state.client.clone(), public_host)
            .with_cooldown_secs(http_state.resend_cooldown_secs);
        Self {
            health_state: web::Data::new(HealthState::new()),
            http_state: web::Data::new(http_state),
            ws_state: web::Data::new(ws_state),
            session,
        }
    }
}

fn session_middleware(settings: SessionSettings) -> SessionMiddleware<CookieSessionStore> {
    let SessionSettings {
        key,
        cookie_secure,
        same_site,
        ttl,
    } = settings;
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE_NAME.into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(PersistentSession::default().session_ttl(ttl))
        .build()
}

/// Assemble the application: pages, actions, probes, the OTP socket and,
/// in debug builds, Swagger UI.
pub fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        ws_state,
        session,
    } = deps;

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(ws_state)
        .wrap(RouteGuard::default())
        .wrap(session_middleware(session))
        .wrap(Trace)
        .service(web::scope("/actions").configure(actions::configure))
        .service(ws::otp_entry)
        .service(ready)
        .service(live)
        .configure(pages::configure);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct the HTTP server and flip readiness once the socket is bound.
///
/// # Errors
///
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let bind_addr = config.bind_addr();
    let ServerConfig {
        session,
        gateway,
        public_host,
        ..
    } = config;
    let mut deps = AppDependencies::new(gateway, session, public_host);
    deps.health_state = health_state.clone();

    let server = HttpServer::new(move || build_app(deps.clone()))
        .bind(bind_addr)?
        .run();

    health_state.mark_ready();
    Ok(server)
}
