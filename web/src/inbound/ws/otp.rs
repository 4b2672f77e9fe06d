//! Per-connection OTP dialog.
//!
//! One socket is one open dialog. The session owns its [`ResendCooldown`],
//! forwards every tick to the browser, and relays `verify`/`resend` frames to
//! the backend. Whatever ends the loop, the cooldown is stopped before the
//! task returns, and dropping the session aborts a ticker that is still
//! running. Heartbeats follow the same contract as the other sockets: ping
//! every 5s, disconnect after 10s without client traffic.

use std::time::{Duration, Instant};

use actix_ws::{CloseCode, CloseReason, Closed, Message, MessageStream, ProtocolError, Session};
use tokio::sync::watch;
use tokio::time;
use tracing::{debug, info, warn};

use super::messages::{ClientFrame, OtpPurpose, ServerFrame};
use super::state::WsState;
use crate::domain::route_guard::DEFAULT_LOGIN_PATH;
use crate::domain::{
    BackendClient, Email, GatewayResult, OtpCode, ResendCooldown, VerifyCodeForm, messages,
};

/// Time between heartbeats to the client (5s in production, shorter in tests).
#[cfg(not(test))]
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(5);
#[cfg(test)]
const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Max idle time before disconnecting the client (10s in production, shorter in tests).
#[cfg(not(test))]
const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);
#[cfg(test)]
const CLIENT_TIMEOUT: Duration = Duration::from_millis(500);

pub(super) async fn handle_otp_session(
    state: WsState,
    email: Email,
    purpose: OtpPurpose,
    session: Session,
    stream: MessageStream,
) {
    let cooldown = ResendCooldown::with_live_counter(state.cooldown_secs, state.live_tickers);
    OtpSession {
        client: state.client,
        email,
        cooldown,
    }
    .run(purpose, session, stream)
    .await;
}

enum SessionEnd {
    ClientClosed(Option<CloseReason>),
    StreamClosed,
    HeartbeatTimeout,
    Protocol(ProtocolError),
    InvalidPayload,
    Network(Closed),
    Verified,
}

enum CloseAction {
    None,
    Close(Option<CloseReason>),
}

struct OtpSession {
    client: BackendClient,
    email: Email,
    cooldown: ResendCooldown,
}

impl OtpSession {
    async fn run(mut self, purpose: OtpPurpose, mut session: Session, mut stream: MessageStream) {
        let mut ticks = self.cooldown.subscribe();
        debug!(?purpose, "OTP dialog opened");

        let mut outcome = self.open(&mut session, purpose).await;
        if outcome.is_ok() {
            outcome = self.serve(&mut session, &mut stream, &mut ticks).await;
        }
        self.cooldown.stop().await;

        if let Err(end) = outcome {
            self.log_shutdown_reason(&end);
            let close_action = self.close_action_for(&end);
            self.close_session_if_needed(session, close_action).await;
        }
    }

    async fn open(
        &mut self,
        session: &mut Session,
        purpose: OtpPurpose,
    ) -> Result<(), SessionEnd> {
        match purpose {
            // The register call already mailed a code.
            OtpPurpose::Registration => {
                self.cooldown.restart().await;
                Ok(())
            }
            OtpPurpose::Activation => self.resend(session).await,
        }
    }

    async fn serve(
        &mut self,
        session: &mut Session,
        stream: &mut MessageStream,
        ticks: &mut watch::Receiver<u32>,
    ) -> Result<(), SessionEnd> {
        let mut last_heartbeat = Instant::now();
        let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    self.handle_heartbeat_tick(session, &last_heartbeat).await?;
                }
                message = stream.recv() => {
                    self.handle_stream_message(session, &mut last_heartbeat, message).await?;
                }
                changed = ticks.changed() => {
                    // The sender lives as long as the cooldown.
                    changed.map_err(|_| SessionEnd::StreamClosed)?;
                    let remaining = *ticks.borrow_and_update();
                    self.send(session, ServerFrame::Cooldown { remaining }).await?;
                }
            }
        }
    }

    async fn handle_heartbeat_tick(
        &self,
        session: &mut Session,
        last_heartbeat: &Instant,
    ) -> Result<(), SessionEnd> {
        if Instant::now().duration_since(*last_heartbeat) > CLIENT_TIMEOUT {
            return Err(SessionEnd::HeartbeatTimeout);
        }

        session.ping(b"").await.map_err(SessionEnd::Network)
    }

    async fn handle_stream_message(
        &mut self,
        session: &mut Session,
        last_heartbeat: &mut Instant,
        message: Option<Result<Message, ProtocolError>>,
    ) -> Result<(), SessionEnd> {
        let Some(message) = message else {
            return Err(SessionEnd::StreamClosed);
        };

        match message {
            Ok(Message::Ping(payload)) => {
                *last_heartbeat = Instant::now();
                session.pong(&payload).await.map_err(SessionEnd::Network)
            }
            Ok(Message::Text(text)) => {
                *last_heartbeat = Instant::now();
                self.handle_text_message(session, text.as_ref()).await
            }
            Ok(Message::Pong(_) | Message::Binary(_) | Message::Continuation(_) | Message::Nop) => {
                *last_heartbeat = Instant::now();
                Ok(())
            }
            Ok(Message::Close(reason)) => Err(SessionEnd::ClientClosed(reason)),
            Err(error) => Err(SessionEnd::Protocol(error)),
        }
    }

    async fn handle_text_message(
        &mut self,
        session: &mut Session,
        text: &str,
    ) -> Result<(), SessionEnd> {
        match serde_json::from_str::<ClientFrame>(text) {
            Ok(ClientFrame::Verify { code }) => self.verify(session, &code).await,
            Ok(ClientFrame::Resend) => self.resend_on_request(session).await,
            Err(error) => {
                warn!(error = %error, "Rejected malformed OTP frame");
                Err(SessionEnd::InvalidPayload)
            }
        }
    }

    async fn verify(&mut self, session: &mut Session, code: &str) -> Result<(), SessionEnd> {
        let code = match OtpCode::parse(code) {
            Ok(code) => code,
            Err(message) => {
                return self.send_error(session, message).await;
            }
        };
        let form = VerifyCodeForm::new(self.email.clone(), code);
        let result = self.client.verify_code(&form).await;
        if !result.ok {
            let message = failure_message(&result, messages::VERIFY_FAILED);
            return self.send_error(session, &message).await;
        }

        self.cooldown.stop().await;
        info!("account activated through OTP dialog");
        self.send(
            session,
            ServerFrame::Verified {
                message: result
                    .message()
                    .unwrap_or(messages::VERIFY_SUCCEEDED)
                    .to_owned(),
                redirect: DEFAULT_LOGIN_PATH.to_owned(),
            },
        )
        .await?;
        Err(SessionEnd::Verified)
    }

    async fn resend_on_request(&mut self, session: &mut Session) -> Result<(), SessionEnd> {
        if self.cooldown.is_running() {
            return self
                .send_error(session, messages::RESEND_COOLING_DOWN)
                .await;
        }
        self.resend(session).await
    }

    async fn resend(&mut self, session: &mut Session) -> Result<(), SessionEnd> {
        let result = self.client.resend_verify_code(&self.email).await;
        if !result.ok {
            let message = failure_message(&result, messages::RESEND_FAILED);
            return self.send_error(session, &message).await;
        }
        self.send(
            session,
            ServerFrame::Resent {
                message: result
                    .message()
                    .unwrap_or(messages::RESEND_SUCCEEDED)
                    .to_owned(),
            },
        )
        .await?;
        self.cooldown.restart().await;
        Ok(())
    }

    async fn send_error(&self, session: &mut Session, message: &str) -> Result<(), SessionEnd> {
        self.send(
            session,
            ServerFrame::Error {
                message: message.to_owned(),
            },
        )
        .await
    }

    async fn send(&self, session: &mut Session, frame: ServerFrame) -> Result<(), SessionEnd> {
        match serde_json::to_string(&frame) {
            Ok(body) => session.text(body).await.map_err(SessionEnd::Network),
            Err(error) => {
                warn!(error = %error, "Failed to serialize OTP frame");
                Ok(())
            }
        }
    }

    fn log_shutdown_reason(&self, end: &SessionEnd) {
        match end {
            SessionEnd::HeartbeatTimeout => {
                warn!("WebSocket heartbeat timeout; closing connection");
            }
            SessionEnd::Protocol(error) => {
                warn!(error = %error, "WebSocket protocol error");
            }
            SessionEnd::Network(error) => {
                warn!(error = %error, "WebSocket send failed; closing connection");
            }
            SessionEnd::InvalidPayload
            | SessionEnd::ClientClosed(_)
            | SessionEnd::StreamClosed
            | SessionEnd::Verified => {}
        }
    }

    fn close_action_for(&self, end: &SessionEnd) -> CloseAction {
        match end {
            SessionEnd::HeartbeatTimeout => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("heartbeat timeout".to_owned()),
            })),
            SessionEnd::Verified => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Normal,
                description: Some("verified".to_owned()),
            })),
            SessionEnd::Protocol(_) => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Protocol,
                description: Some("protocol error".to_owned()),
            })),
            SessionEnd::InvalidPayload => CloseAction::Close(Some(CloseReason {
                code: CloseCode::Policy,
                description: Some("invalid payload".to_owned()),
            })),
            SessionEnd::ClientClosed(reason) => CloseAction::Close(reason.clone()),
            SessionEnd::StreamClosed | SessionEnd::Network(_) => CloseAction::None,
        }
    }

    async fn close_session_if_needed(&self, session: Session, close_action: CloseAction) {
        if let CloseAction::Close(reason) = close_action {
            if let Err(error) = session.close(reason).await {
                warn!(error = %error, "Failed to close WebSocket session");
            }
        }
    }
}

/// Most specific message the backend gave for a failed OTP call.
fn failure_message(result: &GatewayResult, fallback: &str) -> String {
    let remote = result.remote_error();
    if let Some(message) = remote.message() {
        return message.to_owned();
    }
    let (field_errors, form_errors) = remote.attribute();
    field_errors
        .iter()
        .map(|(_, message)| message.to_owned())
        .chain(form_errors)
        .next()
        .unwrap_or_else(|| fallback.to_owned())
}

#[cfg(test)]
#[path = "otp_tests.rs"]
mod tests;
