//! rdesk-agent library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does the agent do?
//!
//! The agent runs on the machine being operated.  It dials out to a relay
//! server over WebSocket and then:
//!
//! 1. Registers with a shared access token (`register_client`).
//! 2. Once accepted, streams JPEG screenshots of the primary display as
//!    `screen_data` messages at a bounded frame rate.
//! 3. Replays `command` messages from the remote operator as native pointer,
//!    wheel and keyboard input.
//! 4. Reconnects with a fixed backoff whenever the link drops or is rejected.

/// Domain layer: configuration, connection state machine, session flags.
pub mod domain;

/// Application layer: use cases and the ports they depend on.
pub mod application;

/// Infrastructure layer: OS adapters, encoder, and network transport.
pub mod infrastructure;
