//! # rdesk-core
//!
//! Shared library for the rdesk remote-session agent containing the message
//! schema spoken with the relay server, command validation, display geometry,
//! and the logical-key translation table.
//!
//! It has zero dependencies on OS APIs, async runtimes, or network sockets,
//! so everything in here can be unit tested on any machine.
//!
//! # Architecture overview (for beginners)
//!
//! The agent runs on the *controlled host*.  It keeps a persistent connection
//! to a relay server, streams JPEG screenshots of the host to the remote
//! operator, and replays the operator's mouse and keyboard commands locally.
//!
//! This crate (`rdesk-core`) is the shared foundation.  It defines:
//!
//! - **`protocol`** – The named messages exchanged with the server
//!   (`register_client`, `screen_data`, `command`, ...), the JSON envelope
//!   they travel in, and the validation that turns a loosely-typed `command`
//!   payload into a strongly-typed [`Command`].
//!
//! - **`domain`** – Pure value types with no OS dependencies:
//!   [`DisplayGeometry`] (the size of the captured screen, never zero) and
//!   the coordinate clamping rules used by the pointer tracker.
//!
//! - **`keymap`** – The translation table that converts operator-side key
//!   names (`"a"`, `"Enter"`, `"KeyA"`, `"Digit5"`) into native Windows
//!   virtual-key codes plus the "extended key" flag.

pub mod domain;
pub mod keymap;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `rdesk_core::Command` instead of `rdesk_core::protocol::command::Command`.
pub use domain::geometry::{DisplayGeometry, GeometryError, PointerPosition};
pub use keymap::{KeyMapError, KeyMapper, NativeKey};
pub use protocol::codec::{decode_envelope, encode_outbound, ProtocolError};
pub use protocol::command::{Command, CommandError, MouseButton};
pub use protocol::messages::{InboundMessage, OutboundMessage};
