//! Transport port: how the lifecycle talks to the relay server.
//!
//! A [`Transport`] opens one link per session.  The link has two halves:
//!
//! - a [`MessageSink`] shared with the capture pipeline for outbound messages,
//! - a receiver of [`TransportEvent`]s consumed only by the lifecycle task.
//!
//! The WebSocket adapter lives in `infrastructure::network`; tests use an
//! in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use rdesk_core::OutboundMessage;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the transport layer.  All of them are transient.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("connect to {url} timed out")]
    Timeout { url: String },

    #[error("transport is not connected")]
    NotConnected,

    #[error("failed to encode outbound message: {0}")]
    Encode(String),

    #[error("send failed: {0}")]
    Send(String),
}

/// What the server sent, or that it went away.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// A named message with its raw payload.
    Message { event: String, data: Value },
    /// The link closed.  No further events follow.
    Disconnected { reason: String },
}

/// Outbound half of a link.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Sends one message, returning once it has been written to the link.
    ///
    /// # Errors
    ///
    /// [`TransportError::NotConnected`] once the link is closed, or
    /// [`TransportError::Send`] if the write itself fails.
    async fn emit(&self, message: OutboundMessage) -> Result<(), TransportError>;

    /// Closes the link.  Idempotent and best-effort.
    async fn close(&self);
}

pub struct TransportLink {
    pub sink: Arc<dyn MessageSink>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Opens links to the relay server.
#[async_trait]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// [`TransportError::Connect`] or [`TransportError::Timeout`].
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError>;
}
