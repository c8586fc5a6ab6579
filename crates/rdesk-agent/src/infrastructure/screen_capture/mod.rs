//! Screen capture and display geometry adapters.
//!
//! On Windows, [`windows::GdiScreenGrabber`] copies the desktop with GDI and
//! [`windows::SystemMetricsGeometry`] / [`windows::PrimaryMonitorGeometry`]
//! answer the display size.  The [`mock`] module is always compiled.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;
