//! WebSocket transport to the relay server.
//!
//! Architecture:
//! - `connect_async` (bounded by `connect_timeout`) opens the socket.
//! - The socket is split.  A writer task takes encoded text frames from a
//!   one-slot `mpsc` queue and acknowledges each over a `oneshot` once the
//!   frame is flushed, so `emit` resolves only after the write.  A reader task
//!   decodes inbound text frames into [`TransportEvent`]s.
//! - One [`CancellationToken`] per link marks it closed.  Either task, or
//!   [`MessageSink::close`], can trip it; the reader then reports
//!   [`TransportEvent::Disconnected`] exactly once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use rdesk_core::{decode_envelope, encode_outbound, OutboundMessage};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn, Instrument};

use crate::application::transport::{
    MessageSink, Transport, TransportError, TransportEvent, TransportLink,
};

/// Outbound frames handed to the writer ahead of the one being written.
const OUTBOUND_QUEUE: usize = 1;
/// Inbound events buffered before the reader stops pulling from the socket.
const EVENT_QUEUE: usize = 64;

/// A frame for the writer and where to report its outcome.
type Outgoing = (String, oneshot::Sender<Result<(), TransportError>>);

/// [`Transport`] over `ws://` or `wss://`.
#[derive(Debug, Clone)]
pub struct WebSocketTransport {
    connect_timeout: Duration,
}

impl WebSocketTransport {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn connect(&self, url: &str) -> Result<TransportLink, TransportError> {
        let (ws_stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout { url: url.to_string() })?
            .map_err(|e| TransportError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        info!(%url, "websocket connected");

        let (mut ws_tx, mut ws_rx) = ws_stream.split();
        let (out_tx, mut out_rx) = mpsc::channel::<Outgoing>(OUTBOUND_QUEUE);
        let (ev_tx, ev_rx) = mpsc::channel::<TransportEvent>(EVENT_QUEUE);
        let closed = CancellationToken::new();

        // ── Writer ────────────────────────────────────────────────────────────
        let writer_closed = closed.clone();
        tokio::spawn(
            async move {
                loop {
                    tokio::select! {
                        _ = writer_closed.cancelled() => {
                            let _ = ws_tx.send(WsMessage::Close(None)).await;
                            break;
                        }
                        next = out_rx.recv() => match next {
                            Some((text, ack)) => {
                                let sent = tokio::select! {
                                    _ = writer_closed.cancelled() => {
                                        let _ = ack.send(Err(TransportError::NotConnected));
                                        break;
                                    }
                                    sent = ws_tx.send(WsMessage::Text(text)) => sent,
                                };
                                if let Err(e) = sent {
                                    warn!("websocket send failed: {e}");
                                    let _ = ack.send(Err(TransportError::Send(e.to_string())));
                                    writer_closed.cancel();
                                    break;
                                }
                                let _ = ack.send(Ok(()));
                            }
                            None => break,
                        },
                    }
                }
                debug!("websocket writer stopped");
            }
            .in_current_span(),
        );

        // ── Reader ────────────────────────────────────────────────────────────
        let reader_closed = closed.clone();
        tokio::spawn(
            async move {
                let reason = loop {
                    let frame = tokio::select! {
                        _ = reader_closed.cancelled() => break "closed locally".to_string(),
                        frame = ws_rx.next() => frame,
                    };
                    match frame {
                        Some(Ok(WsMessage::Text(text))) => match decode_envelope(&text) {
                            Ok(envelope) => {
                                let event = TransportEvent::Message {
                                    event: envelope.event,
                                    data: envelope.data,
                                };
                                if ev_tx.send(event).await.is_err() {
                                    break "event receiver dropped".to_string();
                                }
                            }
                            Err(e) => warn!("ignoring undecodable frame: {e}"),
                        },
                        Some(Ok(WsMessage::Binary(data))) => {
                            warn!(len = data.len(), "ignoring binary websocket frame");
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            break match frame {
                                Some(f) => format!("server closed: {} {}", f.code, f.reason),
                                None => "server closed".to_string(),
                            };
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => break format!("websocket error: {e}"),
                        None => break "stream ended".to_string(),
                    }
                };
                reader_closed.cancel();
                debug!(%reason, "websocket reader stopped");
                let _ = ev_tx.send(TransportEvent::Disconnected { reason }).await;
            }
            .in_current_span(),
        );

        Ok(TransportLink {
            sink: Arc::new(WsSink { out_tx, closed }),
            events: ev_rx,
        })
    }
}

/// Outbound half of a WebSocket link.
struct WsSink {
    out_tx: mpsc::Sender<Outgoing>,
    closed: CancellationToken,
}

#[async_trait]
impl MessageSink for WsSink {
    async fn emit(&self, message: OutboundMessage) -> Result<(), TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::NotConnected);
        }
        let text = encode_outbound(&message).map_err(|e| TransportError::Encode(e.to_string()))?;
        let (ack_tx, ack_rx) = oneshot::channel();
        tokio::select! {
            _ = self.closed.cancelled() => Err(TransportError::NotConnected),
            outcome = async {
                self.out_tx
                    .send((text, ack_tx))
                    .await
                    .map_err(|_| TransportError::NotConnected)?;
                ack_rx.await.map_err(|_| TransportError::NotConnected)?
            } => outcome,
        }
    }

    async fn close(&self) {
        self.closed.cancel();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
