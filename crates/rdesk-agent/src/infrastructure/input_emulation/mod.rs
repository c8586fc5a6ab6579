//! Platform-specific input emulation implementations.
//!
//! The native implementation is selected at compile time via
//! `#[cfg(target_os = ...)]`; only Windows has one.  [`mock::MockInputEmulator`]
//! is always compiled.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
