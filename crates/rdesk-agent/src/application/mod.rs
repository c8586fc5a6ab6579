//! Application layer use cases for the agent.
//!
//! # What use cases does the agent have?
//!
//! - **`emulate_input`** – The input synthesizer: pointer tracking, smoothed
//!   motion, clicks, keys and wheel.  The OS call is made by a
//!   `PlatformInputEmulator` injected at construction time.
//!
//! - **`dispatch_command`** – Validates inbound `command` payloads and routes
//!   them to the synthesizer, but only while the session is registered.
//!
//! - **`display_geometry`** – Resolves the display size from an ordered list
//!   of sources.
//!
//! - **`stream_screen`** – The rate-limited capture pipeline.
//!
//! - **`transport`** – The port through which the lifecycle reaches the relay
//!   server.
//!
//! - **`lifecycle`** – Connect, register, stream, recover.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub mod dispatch_command;
pub mod display_geometry;
pub mod emulate_input;
pub mod lifecycle;
pub mod stream_screen;
pub mod transport;

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Returns `true` if the full duration elapsed, `false` if cancelled.
pub(crate) async fn interruptible_sleep(cancel: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
