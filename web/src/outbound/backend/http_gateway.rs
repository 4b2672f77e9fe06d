//! Reqwest-backed [`BackendGateway`].
//!
//! This adapter owns transport details only: URL resolution, default
//! headers, trace propagation and JSON decoding. It never retries and sets no
//! timeout of its own. Every failure is logged and folded into
//! [`GatewayResult::transport_failure`].

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method};
use serde_json::Value;
use tracing::{debug, warn};

use super::BackendBaseUrl;
use crate::domain::ports::BackendGateway;
use crate::domain::{GatewayMethod, GatewayRequest, GatewayResult};
use crate::middleware::trace::{TRACE_ID_HEADER, TraceId};

/// Gateway issuing real HTTP calls against one backend base address.
#[derive(Debug, Clone)]
pub struct ReqwestBackendGateway {
    client: Client,
    base: BackendBaseUrl,
}

impl ReqwestBackendGateway {
    /// Build the gateway with a default reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base: BackendBaseUrl) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &BackendBaseUrl {
        &self.base
    }
}

#[async_trait]
impl BackendGateway for ReqwestBackendGateway {
    async fn call(&self, request: GatewayRequest) -> GatewayResult {
        let url = match self.base.resolve(&request.path) {
            Ok(url) => url,
            Err(error) => {
                warn!(%error, path = %request.path, "could not resolve backend path");
                return GatewayResult::transport_failure();
            }
        };

        let Some(headers) = headers_for(&request) else {
            warn!(path = %request.path, "session token is not a valid header value");
            return GatewayResult::no_session();
        };
        let mut builder = self
            .client
            .request(method_for(request.method), url)
            .headers(headers);
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let response = match builder.send().await {
            Ok(response) => response,
            Err(error) => {
                warn!(%error, path = %request.path, "backend request failed");
                return GatewayResult::transport_failure();
            }
        };
        let status = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(error) => {
                warn!(%error, path = %request.path, status, "backend response body unreadable");
                return GatewayResult::transport_failure();
            }
        };
        match serde_json::from_slice::<Value>(&body) {
            Ok(data) => {
                debug!(path = %request.path, status, "backend answered");
                GatewayResult::from_response(status, data)
            }
            Err(error) => {
                warn!(%error, path = %request.path, status, "backend response is not JSON");
                GatewayResult::transport_failure()
            }
        }
    }
}

fn method_for(method: GatewayMethod) -> Method {
    match method {
        GatewayMethod::Get => Method::GET,
        GatewayMethod::Post => Method::POST,
        GatewayMethod::Put => Method::PUT,
        GatewayMethod::Patch => Method::PATCH,
        GatewayMethod::Delete => Method::DELETE,
    }
}

/// Defaults first, caller headers last so they win. `None` when the bearer
/// cannot be sent.
fn headers_for(request: &GatewayRequest) -> Option<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(trace_id) = TraceId::current() {
        if let Ok(value) = HeaderValue::from_str(&trace_id.to_string()) {
            headers.insert(HeaderName::from_static(TRACE_ID_HEADER), value);
        }
    }
    if let Some(token) = &request.bearer {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}")).ok()?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }
    for (name, value) in &request.headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                headers.insert(name, value);
            }
            _ => warn!(header = %name, "dropping invalid header"),
        }
    }
    Some(headers)
}

#[cfg(test)]
mod tests {
    //! Exercises the adapter against a throwaway local backend.
    use super::*;
    use actix_web::{App, HttpRequest, HttpResponse, HttpServer, web};
    use serde_json::json;
    use std::net::TcpListener;

    async fn echo(req: HttpRequest, body: web::Bytes) -> HttpResponse {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };
        HttpResponse::Ok().json(json!({
            "method": req.method().as_str(),
            "path": req.path(),
            "contentType": header("content-type"),
            "authorization": header("authorization"),
            "traceId": header(TRACE_ID_HEADER),
            "body": String::from_utf8_lossy(&body),
        }))
    }

    fn spawn_backend() -> BackendBaseUrl {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        let server = HttpServer::new(|| {
            App::new()
                .route("/echo", web::to(echo))
                .route(
                    "/locked",
                    web::post().to(|| async {
                        HttpResponse::build(actix_web::http::StatusCode::LOCKED)
                            .json(json!({ "code": 423, "message": "chưa kích hoạt" }))
                    }),
                )
                .route(
                    "/html",
                    web::get().to(|| async {
                        HttpResponse::BadGateway()
                            .content_type("text/html")
                            .body("<h1>bad gateway</h1>")
                    }),
                )
        })
        .disable_signals()
        .workers(1)
        .listen(listener)
        .expect("listen")
        .run();
        actix_web::rt::spawn(server);
        BackendBaseUrl::parse(&format!("http://{addr}")).expect("base url")
    }

    fn gateway(base: BackendBaseUrl) -> ReqwestBackendGateway {
        ReqwestBackendGateway::new(base).expect("client")
    }

    #[actix_web::test]
    async fn sends_json_defaults_and_bearer() {
        let result = gateway(spawn_backend())
            .call(
                GatewayRequest::post("echo")
                    .with_body(json!({ "email": "an@example.vn" }))
                    .with_bearer("tok"),
            )
            .await;

        assert!(result.ok);
        assert_eq!(result.data["method"], "POST");
        assert_eq!(result.data["path"], "/echo");
        assert_eq!(result.data["contentType"], "application/json");
        assert_eq!(result.data["authorization"], "Bearer tok");
        assert_eq!(result.data["body"], r#"{"email":"an@example.vn"}"#);
    }

    #[actix_web::test]
    async fn caller_headers_override_defaults() {
        let result = gateway(spawn_backend())
            .call(
                GatewayRequest::get("/echo")
                    .with_bearer("tok")
                    .with_header("Authorization", "Basic abc")
                    .with_header("Content-Type", "application/merge-patch+json"),
            )
            .await;

        assert_eq!(result.data["authorization"], "Basic abc");
        assert_eq!(result.data["contentType"], "application/merge-patch+json");
    }

    #[actix_web::test]
    async fn unsendable_token_is_treated_as_no_session() {
        let result = gateway(spawn_backend())
            .call(GatewayRequest::get("/echo").with_bearer("tok\nInjected: yes"))
            .await;

        assert_eq!(result, GatewayResult::no_session());
    }

    #[actix_web::test]
    async fn forwards_the_trace_id_in_scope() {
        let trace_id: TraceId = "6f1c4cfa-1f7e-4b55-9d0c-0a4f7c3d2e11"
            .parse()
            .expect("trace id");
        let gateway = gateway(spawn_backend());
        let result =
            TraceId::scope(trace_id, gateway.call(GatewayRequest::get("/echo"))).await;

        assert_eq!(result.data["traceId"], trace_id.to_string());
    }

    #[actix_web::test]
    async fn non_2xx_json_is_passed_through() {
        let result = gateway(spawn_backend())
            .call(GatewayRequest::post("/locked"))
            .await;

        assert!(!result.ok);
        assert_eq!(result.status, 423);
        assert_eq!(result.message(), Some("chưa kích hoạt"));
    }

    #[actix_web::test]
    async fn non_json_body_is_a_transport_failure() {
        let result = gateway(spawn_backend())
            .call(GatewayRequest::get("/html"))
            .await;

        assert_eq!(result, GatewayResult::transport_failure());
    }

    #[actix_web::test]
    async fn unreachable_backend_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let base = BackendBaseUrl::parse(&format!("http://{addr}")).expect("base url");

        let result = gateway(base).call(GatewayRequest::get("/echo")).await;

        assert_eq!(result, GatewayResult::transport_failure());
    }
}
