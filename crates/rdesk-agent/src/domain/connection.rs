//! Connection lifecycle state machine.
//!
//! The lifecycle task is the only writer of connection state, and every change
//! goes through [`ConnectionState::on`].  Keeping the transition table in one
//! pure function means the legal moves can be tested exhaustively without a
//! network, a runtime, or a clock.
//!
//! ```text
//!                 ConnectRequested
//!   Disconnected ─────────────────▶ Connecting ──ConnectFailed──▶ Disconnected
//!        ▲   ▲                          │
//!        │   │                 TransportConnected
//!        │   │                          ▼
//!        │   └──TransportDropped──── Connected ──SessionAborted──▶ Failed
//!        │      RegistrationRejected    │                           │
//!        │                   RegistrationAccepted                   │
//!        │                              ▼                           │
//!        └──TransportDropped──────── Registered      ConnectRequested
//!           RegistrationRejected                                    ▼
//!                                                               Connecting
//! ```
//!
//! `Shutdown` is accepted from every state and always lands in `Disconnected`.

use std::fmt;

use thiserror::Error;

/// Where the agent is in its connect → register cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    /// Transport is up; `register_client` has been or is being sent.
    Connected,
    /// Server acknowledged the token.  Frames flow and commands execute.
    Registered,
    /// Session-fatal error after connecting (no geometry, registration emit
    /// failed).  The lifecycle retries from here after the backoff.
    Failed,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Registered => "registered",
            ConnectionState::Failed => "failed",
        })
    }
}

/// Inputs to the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    ConnectRequested,
    TransportConnected,
    ConnectFailed,
    RegistrationAccepted,
    RegistrationRejected,
    TransportDropped,
    SessionAborted,
    Shutdown,
}

/// A transition that the table does not allow.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("invalid transition: {event:?} in state {from}")]
pub struct InvalidTransition {
    pub from: ConnectionState,
    pub event: LifecycleEvent,
}

impl ConnectionState {
    /// Applies `event` and returns the next state.
    ///
    /// A repeated `RegistrationAccepted` while already registered is legal and
    /// leaves the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTransition`] for any pair not in the table.
    pub fn on(self, event: LifecycleEvent) -> Result<ConnectionState, InvalidTransition> {
        use ConnectionState as S;
        use LifecycleEvent as E;

        let next = match (self, event) {
            (_, E::Shutdown) => S::Disconnected,
            (S::Disconnected | S::Failed, E::ConnectRequested) => S::Connecting,
            (S::Connecting, E::TransportConnected) => S::Connected,
            (S::Connecting, E::ConnectFailed) => S::Disconnected,
            (S::Connected | S::Registered, E::RegistrationAccepted) => S::Registered,
            (S::Connected | S::Registered, E::RegistrationRejected | E::TransportDropped) => {
                S::Disconnected
            }
            (S::Connected, E::SessionAborted) => S::Failed,
            (from, event) => return Err(InvalidTransition { from, event }),
        };
        Ok(next)
    }
}

/// Observable status published by the lifecycle on every transition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// The most recent error, kept until the next successful registration.
    pub last_error: Option<String>,
    /// Consecutive failed connect attempts since the last registration.
    pub retry_count: u32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
