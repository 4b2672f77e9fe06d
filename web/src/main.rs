//! Entry point: loads configuration, wires the backend gateway and serves.

use std::sync::Arc;

use actix_web::web;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use threads_web::inbound::http::health::HealthState;
use threads_web::inbound::http::session_config::{
    BuildMode, ProcessEnv, fingerprint::key_fingerprint, session_settings_from_env,
};
use threads_web::outbound::backend::ReqwestBackendGateway;
use threads_web::server::{BackendSettings, ServerConfig, ServerSettings, create_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let backend = BackendSettings::from_env()
        .and_then(|settings| settings.base_url())
        .map_err(std::io::Error::other)?;
    let server_settings = ServerSettings::from_env().map_err(std::io::Error::other)?;
    let bind_addr = server_settings.bind_addr().map_err(std::io::Error::other)?;

    let session = session_settings_from_env(&ProcessEnv, BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        secure = session.cookie_secure,
        ttl_minutes = session.ttl.whole_minutes(),
        "session key loaded"
    );

    let gateway = ReqwestBackendGateway::new(backend).map_err(std::io::Error::other)?;
    info!(backend = %gateway.base(), %bind_addr, "starting server");

    let config = ServerConfig::new(session, bind_addr, Arc::new(gateway))
        .with_public_host(server_settings.public_host);
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    let result = server.await;
    health_state.mark_unhealthy();
    result
}
