//! Named messages exchanged between the agent and the relay server.
//!
//! Every message is a pair of an *event name* and a JSON *payload*.  The
//! event names are fixed strings; the payload shapes are the structs below.
//!
//! | Direction | Event                  | Payload                       |
//! |-----------|------------------------|-------------------------------|
//! | out       | `register_client`      | [`RegisterClientPayload`]     |
//! | out       | `screen_data`          | [`ScreenDataPayload`]         |
//! | in        | `registration_success` | none (ignored if present)     |
//! | in        | `registration_fail`    | [`RegistrationFailPayload`]   |
//! | in        | `command`              | [`CommandPayload`]            |

use serde::{Deserialize, Serialize};

// ── Event names ───────────────────────────────────────────────────────────────

pub const EVENT_REGISTER_CLIENT: &str = "register_client";
pub const EVENT_SCREEN_DATA: &str = "screen_data";
pub const EVENT_REGISTRATION_SUCCESS: &str = "registration_success";
pub const EVENT_REGISTRATION_FAIL: &str = "registration_fail";
pub const EVENT_COMMAND: &str = "command";

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Credential presented right after the transport connects.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterClientPayload {
    pub token: String,
}

impl std::fmt::Debug for RegisterClientPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterClientPayload")
            .field("token", &"***")
            .finish()
    }
}

/// One captured frame: a base64-encoded JPEG.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenDataPayload {
    pub image: String,
}

/// Server-side rejection of the credential.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationFailPayload {
    #[serde(default)]
    pub message: Option<String>,
}

/// Loosely-typed operator command as it arrives on the wire.
///
/// Every field is optional at this level; [`crate::protocol::command::Command`]
/// is the validated form.  Numbers are accepted as integers or floats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub button: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dy: Option<f64>,
}

// ── Message enums ─────────────────────────────────────────────────────────────

/// Messages the agent sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    RegisterClient(RegisterClientPayload),
    ScreenData(ScreenDataPayload),
}

impl OutboundMessage {
    /// Convenience constructor for the registration message.
    pub fn register(token: impl Into<String>) -> Self {
        Self::RegisterClient(RegisterClientPayload {
            token: token.into(),
        })
    }

    /// Convenience constructor for a frame message.
    pub fn screen_data(image: impl Into<String>) -> Self {
        Self::ScreenData(ScreenDataPayload {
            image: image.into(),
        })
    }

    /// The event name this message travels under.
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::RegisterClient(_) => EVENT_REGISTER_CLIENT,
            Self::ScreenData(_) => EVENT_SCREEN_DATA,
        }
    }
}

/// Messages the agent receives.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    RegistrationSuccess,
    RegistrationFail(RegistrationFailPayload),
    Command(CommandPayload),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_payload_debug_redacts_token() {
        let p = RegisterClientPayload {
            token: "hunter2".to_string(),
        };
        let dbg = format!("{p:?}");
        assert!(!dbg.contains("hunter2"));
        assert!(dbg.contains("***"));
    }

    #[test]
    fn test_command_payload_accepts_integer_and_float_numbers() {
        // Arrange
        let json = r#"{"action":"move","x":10,"y":20.5}"#;

        // Act
        let p: CommandPayload = serde_json::from_str(json).unwrap();

        // Assert
        assert_eq!(p.action.as_deref(), Some("move"));
        assert_eq!(p.x, Some(10.0));
        assert_eq!(p.y, Some(20.5));
        assert_eq!(p.button, None);
    }

    #[test]
    fn test_command_payload_ignores_unknown_fields() {
        let p: CommandPayload =
            serde_json::from_str(r#"{"action":"click","shift":true}"#).unwrap();
        assert_eq!(p.action.as_deref(), Some("click"));
    }

    #[test]
    fn test_registration_fail_message_is_optional() {
        let p: RegistrationFailPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(p.message, None);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(OutboundMessage::register("t").event_name(), "register_client");
        assert_eq!(OutboundMessage::screen_data("x").event_name(), "screen_data");
    }
}
