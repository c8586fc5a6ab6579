//! Infrastructure layer for the agent.
//!
//! Contains OS-facing adapters: input emulation, screen capture, JPEG
//! encoding, and the WebSocket transport.
//!
//! **Dependency rule**: this layer may depend on `application`, `domain` and
//! `rdesk_core`, but MUST NOT be imported by the `application` or domain
//! layers (test modules excepted).
//!
//! # Sub-modules
//!
//! - **`input_emulation`** – `PlatformInputEmulator` implementations.  Windows
//!   uses `SetCursorPos` / `SendInput`; `MockInputEmulator` is always built.
//!
//! - **`screen_capture`** – `ScreenGrabber` and `GeometrySource`
//!   implementations.  Windows uses GDI and `GetSystemMetrics`.
//!
//! - **`encoder`** – `FrameEncoder` backed by the `image` crate's JPEG codec.
//!
//! - **`network`** – `Transport` over `tokio-tungstenite`.

pub mod encoder;
pub mod input_emulation;
pub mod network;
pub mod screen_capture;
