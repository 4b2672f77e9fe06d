//! Wire-level frames exchanged on the OTP socket.

use serde::{Deserialize, Serialize};

/// Why the dialog was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtpPurpose {
    /// Right after registering; the backend already mailed a code.
    Registration,
    /// Login refused an account that was never activated.
    Activation,
}

/// Frames sent by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientFrame {
    Verify { code: String },
    Resend,
}

/// Frames sent to the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    /// Seconds left before the resend button unlocks.
    Cooldown { remaining: u32 },
    Resent { message: String },
    Verified { message: String, redirect: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({ "type": "verify", "code": "123456" }), ClientFrame::Verify { code: "123456".into() })]
    #[case(json!({ "type": "resend" }), ClientFrame::Resend)]
    fn decodes_client_frames(#[case] raw: serde_json::Value, #[case] expected: ClientFrame) {
        let frame: ClientFrame = serde_json::from_value(raw).expect("frame");
        assert_eq!(frame, expected);
    }

    #[test]
    fn rejects_unknown_client_frame() {
        let result = serde_json::from_value::<ClientFrame>(json!({ "type": "cancel" }));
        assert!(result.is_err());
    }

    #[test]
    fn tags_server_frames() {
        let frame = ServerFrame::Verified {
            message: "ok".into(),
            redirect: "/login".into(),
        };
        assert_eq!(
            serde_json::to_value(frame).expect("json"),
            json!({ "type": "verified", "message": "ok", "redirect": "/login" })
        );
    }
}
