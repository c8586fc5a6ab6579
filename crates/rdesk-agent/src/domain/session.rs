//! Per-session flags shared between the lifecycle task and the capture task.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared session state.
///
/// The lifecycle sets `registered` on `registration_success` and clears it on
/// every session end.  The capture pipeline reads it before grabbing and again
/// before sending, and clears it itself when a send fails.
///
/// Stores use `Release` and loads use `Acquire` so a reader that observes
/// `true` also observes everything the lifecycle did before setting it.
#[derive(Debug, Default)]
pub struct SessionFlags {
    registered: AtomicBool,
}

impl SessionFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::Acquire)
    }

    pub fn set_registered(&self) {
        self.registered.store(true, Ordering::Release);
    }

    /// Clears the flag and returns whether it was set.
    pub fn clear_registered(&self) -> bool {
        self.registered.swap(false, Ordering::AcqRel)
    }
}
