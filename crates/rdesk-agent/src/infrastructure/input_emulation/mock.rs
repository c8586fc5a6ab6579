//! Mock platform input emulator.
//!
//! # Why a mock emulator?
//!
//! The real emulator (`WindowsInputEmulator`) makes OS API calls that need a
//! desktop session, actually move the cursor on the machine running the
//! tests, and cannot be observed from Rust test code.
//!
//! `MockInputEmulator` replaces all OS calls with in-memory recording.  Each
//! emitted event is pushed into a `Mutex<Vec<...>>` so assertions can inspect
//! exactly what was emitted and in what order.  The agent binary also falls
//! back to it on platforms without a native emulator, so the protocol side
//! can be exercised anywhere.
//!
//! # Usage in tests
//!
//! ```ignore
//! let emulator = Arc::new(MockInputEmulator::new());
//! let mut synth = InputSynthesizer::new(emulator.clone(), MotionSettings::default());
//! synth.begin_session(DisplayGeometry::new(800, 600)?);
//! synth.scroll(0.0, 1.0).await?;
//!
//! assert_eq!(*emulator.wheels.lock().unwrap(), vec![(WheelAxis::Vertical, -120)]);
//! ```
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` to make every call return
//! `EmulationError::Platform`, for testing error paths without a broken OS.

use std::sync::{Mutex, PoisonError};

use rdesk_core::{MouseButton, NativeKey, PointerPosition};

use crate::application::emulate_input::{EmulationError, PlatformInputEmulator, WheelAxis};

/// A mock emulator that records all calls without performing OS API calls.
#[derive(Debug, Default)]
pub struct MockInputEmulator {
    /// Every `(x, y)` passed to `set_cursor_position`.
    pub cursor_moves: Mutex<Vec<(i32, i32)>>,
    /// `(button, pressed)` pairs.
    pub buttons: Mutex<Vec<(MouseButton, bool)>>,
    /// `(axis, delta)` pairs.
    pub wheels: Mutex<Vec<(WheelAxis, i32)>>,
    /// `(key, pressed)` pairs.
    pub keys: Mutex<Vec<(NativeKey, bool)>>,
    /// Simulated host cursor, updated by `set_cursor_position`.
    pub cursor: Mutex<PointerPosition>,
    pub should_fail: bool,
}

impl MockInputEmulator {
    /// Creates a mock with empty records, the cursor at the origin, and
    /// `should_fail = false`.
    pub fn new() -> Self {
        Self::default()
    }

    fn check(&self) -> Result<(), EmulationError> {
        if self.should_fail {
            return Err(EmulationError::Platform("mock failure".into()));
        }
        Ok(())
    }
}

impl PlatformInputEmulator for MockInputEmulator {
    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), EmulationError> {
        self.check()?;
        self.cursor_moves.lock().unwrap_or_else(PoisonError::into_inner).push((x, y));
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = PointerPosition::new(x, y);
        Ok(())
    }

    fn cursor_position(&self) -> Result<PointerPosition, EmulationError> {
        self.check()?;
        Ok(*self.cursor.lock().unwrap_or_else(PoisonError::into_inner))
    }

    fn emit_mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), EmulationError> {
        self.check()?;
        self.buttons.lock().unwrap_or_else(PoisonError::into_inner).push((button, pressed));
        Ok(())
    }

    fn emit_wheel(&self, axis: WheelAxis, delta: i32) -> Result<(), EmulationError> {
        self.check()?;
        self.wheels.lock().unwrap_or_else(PoisonError::into_inner).push((axis, delta));
        Ok(())
    }

    fn emit_key(&self, key: NativeKey, pressed: bool) -> Result<(), EmulationError> {
        self.check()?;
        self.keys.lock().unwrap_or_else(PoisonError::into_inner).push((key, pressed));
        Ok(())
    }
}
