//! OTP socket tests against a live server.

use super::*;
use crate::domain::backend_client::paths;
use crate::domain::ports::MockBackendGateway;
use crate::inbound::ws;
use actix_web::{App, HttpServer, dev::ServerHandle, http::header, test as actix_test};
use awc::{BoxedSocket, ws::Codec, ws::Frame, ws::Message as ClientMessage};
use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use std::sync::Arc;
use std::sync::atomic::Ordering;

type Socket = actix_codec::Framed<BoxedSocket, Codec>;

const COOLDOWN_SECS: u32 = 30;

fn ws_state(gateway: MockBackendGateway) -> WsState {
    WsState::new(BackendClient::new(Arc::new(gateway)), None).with_cooldown_secs(COOLDOWN_SECS)
}

async fn connect(state: WsState, query: &str) -> (Socket, ServerHandle) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("listener addr");
    let server = HttpServer::new(move || {
        App::new()
            .app_data(actix_web::web::Data::new(state.clone()))
            .service(ws::otp_entry)
    })
    .listen(listener)
    .expect("bind test server")
    .disable_signals()
    .workers(1)
    .run();
    let handle = server.handle();
    actix_web::rt::spawn(server);

    let (_resp, socket) = awc::Client::default()
        .ws(format!("http://{addr}/ws/otp?{query}"))
        .set_header(header::ORIGIN, "http://localhost:3000")
        .connect()
        .await
        .expect("websocket connect");
    (socket, handle)
}

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Text(bytes) => return serde_json::from_slice(&bytes).expect("json"),
            Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

/// Next frame that is not a cooldown tick.
async fn next_event(socket: &mut Socket) -> Value {
    loop {
        let value = next_json(socket).await;
        if value["type"] != "cooldown" {
            return value;
        }
    }
}

async fn next_close(socket: &mut Socket) -> Option<CloseReason> {
    loop {
        let frame = socket.next().await.expect("response frame").expect("frame");
        match frame {
            Frame::Close(reason) => return reason,
            Frame::Text(_) | Frame::Ping(_) | Frame::Pong(_) => continue,
            other => panic!("expected close frame, got {other:?}"),
        }
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(ClientMessage::Text(value.to_string().into()))
        .await
        .expect("send text");
}

async fn wait_for_no_tickers(state: &WsState) {
    let live = Arc::clone(&state.live_tickers);
    time::timeout(Duration::from_secs(2), async move {
        while live.load(Ordering::SeqCst) != 0 {
            time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("ticker still alive after the socket closed");
}

fn silent_gateway() -> MockBackendGateway {
    let mut gateway = MockBackendGateway::new();
    gateway.expect_call().never();
    gateway
}

#[actix_rt::test]
async fn registration_starts_the_cooldown_without_resending() {
    let (mut socket, _server) = connect(
        ws_state(silent_gateway()),
        "email=an%40example.vn&purpose=registration",
    )
    .await;

    let frame = next_json(&mut socket).await;
    assert_eq!(frame, json!({ "type": "cooldown", "remaining": COOLDOWN_SECS }));
}

#[actix_rt::test]
async fn activation_resends_on_open_then_cools_down() {
    let mut gateway = MockBackendGateway::new();
    gateway
        .expect_call()
        .withf(|request| {
            request.path == paths::RESEND_VERIFY_CODE
                && request.body == Some(json!({ "email": "an@example.vn" }))
        })
        .times(1)
        .returning(|_| GatewayResult::from_response(200, json!({ "message": "Đã gửi" })));
    let (mut socket, _server) = connect(
        ws_state(gateway),
        "email=an%40example.vn&purpose=activation",
    )
    .await;

    assert_eq!(
        next_json(&mut socket).await,
        json!({ "type": "resent", "message": "Đã gửi" })
    );
    assert_eq!(
        next_json(&mut socket).await,
        json!({ "type": "cooldown", "remaining": COOLDOWN_SECS })
    );
}

#[actix_rt::test]
async fn resend_is_refused_while_cooling_down() {
    let (mut socket, _server) = connect(
        ws_state(silent_gateway()),
        "email=an%40example.vn&purpose=registration",
    )
    .await;
    next_json(&mut socket).await;

    send_json(&mut socket, json!({ "type": "resend" })).await;

    assert_eq!(
        next_event(&mut socket).await,
        json!({ "type": "error", "message": messages::RESEND_COOLING_DOWN })
    );
}

#[actix_rt::test]
async fn malformed_code_never_reaches_the_backend() {
    let (mut socket, _server) = connect(
        ws_state(silent_gateway()),
        "email=an%40example.vn&purpose=registration",
    )
    .await;

    send_json(&mut socket, json!({ "type": "verify", "code": "12ab" })).await;

    assert_eq!(
        next_event(&mut socket).await,
        json!({ "type": "error", "message": messages::fields::OTP_INVALID })
    );
}

#[actix_rt::test]
async fn wrong_code_reports_the_backend_message() {
    let mut gateway = MockBackendGateway::new();
    gateway
        .expect_call()
        .withf(|request| request.path == paths::VERIFY_CODE)
        .times(1)
        .returning(|_| {
            GatewayResult::from_response(
                400,
                json!({ "errors": [{ "field": "code", "message": "Mã OTP không đúng" }] }),
            )
        });
    let (mut socket, _server) = connect(
        ws_state(gateway),
        "email=an%40example.vn&purpose=registration",
    )
    .await;

    send_json(&mut socket, json!({ "type": "verify", "code": "123456" })).await;

    assert_eq!(
        next_event(&mut socket).await,
        json!({ "type": "error", "message": "Mã OTP không đúng" })
    );
}

#[actix_rt::test]
async fn verified_code_closes_the_dialog_and_clears_the_ticker() {
    let mut gateway = MockBackendGateway::new();
    gateway
        .expect_call()
        .withf(|request| {
            request.path == paths::VERIFY_CODE
                && request.body == Some(json!({ "email": "an@example.vn", "code": "123456" }))
        })
        .times(1)
        .returning(|_| GatewayResult::from_response(200, json!({})));
    let state = ws_state(gateway);
    let (mut socket, _server) =
        connect(state.clone(), "email=an%40example.vn&purpose=registration").await;
    next_json(&mut socket).await;

    send_json(&mut socket, json!({ "type": "verify", "code": "123456" })).await;

    assert_eq!(
        next_event(&mut socket).await,
        json!({
            "type": "verified",
            "message": messages::VERIFY_SUCCEEDED,
            "redirect": "/login"
        })
    );
    let reason = next_close(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Normal);
    wait_for_no_tickers(&state).await;
}

#[actix_rt::test]
async fn repeated_open_and_close_leaves_no_ticker_behind() {
    let state = ws_state(silent_gateway());
    for _ in 0..3 {
        let (mut socket, _server) =
            connect(state.clone(), "email=an%40example.vn&purpose=registration").await;
        next_json(&mut socket).await;
        assert!(state.live_tickers.load(Ordering::SeqCst) >= 1);
        socket
            .send(ClientMessage::Close(None))
            .await
            .expect("send close");
        wait_for_no_tickers(&state).await;
    }
}

#[actix_rt::test]
async fn closes_on_malformed_json() {
    let (mut socket, _server) = connect(
        ws_state(silent_gateway()),
        "email=an%40example.vn&purpose=registration",
    )
    .await;

    socket
        .send(ClientMessage::Text("not-json".into()))
        .await
        .expect("send text");

    let reason = next_close(&mut socket).await.expect("close reason");
    assert_eq!(reason.code, CloseCode::Policy);
}

#[actix_rt::test]
async fn closes_after_timeout_without_client_messages() {
    let state = ws_state(silent_gateway());
    let (mut socket, _server) =
        connect(state.clone(), "email=an%40example.vn&purpose=registration").await;

    let reason = time::timeout(CLIENT_TIMEOUT + HEARTBEAT_INTERVAL * 10, next_close(&mut socket))
        .await
        .expect("close frame missing within timeout")
        .expect("close reason");

    assert_eq!(reason.code, CloseCode::Normal);
    assert_eq!(reason.description.as_deref(), Some("heartbeat timeout"));
    wait_for_no_tickers(&state).await;
}

#[actix_rt::test]
async fn upgrade_without_origin_is_forbidden() {
    let app = actix_test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(ws_state(silent_gateway())))
            .service(ws::otp_entry),
    )
    .await;
    let req = actix_test::TestRequest::get()
        .uri("/ws/otp?email=an%40example.vn&purpose=registration")
        .to_request();

    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), actix_web::http::StatusCode::FORBIDDEN);
}

#[actix_rt::test]
async fn upgrade_with_invalid_email_is_rejected() {
    let app = actix_test::init_service(
        App::new()
            .app_data(actix_web::web::Data::new(ws_state(silent_gateway())))
            .service(ws::otp_entry),
    )
    .await;
    let req = actix_test::TestRequest::get()
        .uri("/ws/otp?email=nope&purpose=activation")
        .insert_header((header::ORIGIN, "http://localhost:3000"))
        .to_request();

    let res = actix_test::call_service(&app, req).await;

    assert_eq!(res.status(), actix_web::http::StatusCode::BAD_REQUEST);
}
