//! JSON envelope codec for agent ↔ server messages.
//!
//! Wire format: one text frame per message,
//! ```text
//! {"event": "<name>", "data": <payload>}
//! ```
//! `data` may be omitted or `null` for messages without a payload.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::protocol::messages::{
    InboundMessage, OutboundMessage, EVENT_COMMAND, EVENT_REGISTRATION_FAIL,
    EVENT_REGISTRATION_SUCCESS,
};

/// Errors that can occur while encoding or decoding envelopes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The frame was not a JSON object with an `event` string.
    #[error("invalid envelope: {0}")]
    InvalidEnvelope(String),

    /// The event name is not one the agent handles.
    #[error("unknown event {0:?}")]
    UnknownEvent(String),

    /// The payload did not match the shape expected for its event.
    #[error("malformed {event} payload: {reason}")]
    MalformedPayload { event: String, reason: String },

    /// Serialization of an outbound payload failed.
    #[error("failed to encode {event}: {reason}")]
    Encode { event: &'static str, reason: String },
}

/// The outer JSON object every message travels in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes an [`OutboundMessage`] into its envelope text.
///
/// # Errors
///
/// Returns [`ProtocolError::Encode`] if the payload cannot be serialized.
///
/// # Examples
///
/// ```rust
/// use rdesk_core::protocol::codec::encode_outbound;
/// use rdesk_core::OutboundMessage;
///
/// let text = encode_outbound(&OutboundMessage::register("secret")).unwrap();
/// assert_eq!(text, r#"{"event":"register_client","data":{"token":"secret"}}"#);
/// ```
pub fn encode_outbound(msg: &OutboundMessage) -> Result<String, ProtocolError> {
    let event = msg.event_name();
    let data = match msg {
        OutboundMessage::RegisterClient(p) => serde_json::to_value(p),
        OutboundMessage::ScreenData(p) => serde_json::to_value(p),
    }
    .map_err(|e| ProtocolError::Encode {
        event,
        reason: e.to_string(),
    })?;

    serde_json::to_string(&Envelope {
        event: event.to_string(),
        data,
    })
    .map_err(|e| ProtocolError::Encode {
        event,
        reason: e.to_string(),
    })
}

/// Parses envelope text into its event name and raw payload.
///
/// # Errors
///
/// Returns [`ProtocolError::InvalidEnvelope`] if `text` is not an envelope.
pub fn decode_envelope(text: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(text).map_err(|e| ProtocolError::InvalidEnvelope(e.to_string()))
}

/// Interprets an event name and payload as an [`InboundMessage`].
///
/// # Errors
///
/// - [`ProtocolError::UnknownEvent`] for event names the agent does not handle.
/// - [`ProtocolError::MalformedPayload`] if the payload has the wrong shape.
pub fn decode_inbound(event: &str, data: Value) -> Result<InboundMessage, ProtocolError> {
    match event {
        EVENT_REGISTRATION_SUCCESS => Ok(InboundMessage::RegistrationSuccess),
        EVENT_REGISTRATION_FAIL => Ok(InboundMessage::RegistrationFail(payload(event, data)?)),
        EVENT_COMMAND => Ok(InboundMessage::Command(payload(event, data)?)),
        other => Err(ProtocolError::UnknownEvent(other.to_string())),
    }
}

impl Envelope {
    /// Shorthand for [`decode_inbound`] on this envelope.
    pub fn into_inbound(self) -> Result<InboundMessage, ProtocolError> {
        decode_inbound(&self.event, self.data)
    }
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Missing or `null` payloads decode as the type's default.
fn payload<T: DeserializeOwned + Default>(event: &str, data: Value) -> Result<T, ProtocolError> {
    if data.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(data).map_err(|e| ProtocolError::MalformedPayload {
        event: event.to_string(),
        reason: e.to_string(),
    })
}
