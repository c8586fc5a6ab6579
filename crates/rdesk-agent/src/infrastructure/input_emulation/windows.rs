//! Windows input emulation via `SetCursorPos` and `SendInput`.
//!
//! The pointer is placed with `SetCursorPos` (physical pixels, no
//! normalisation); buttons, wheel and keys are injected with `SendInput`.
//! Keys are sent by virtual-key code, with `KEYEVENTF_EXTENDEDKEY` when the
//! key mapper flags them.

#![cfg(target_os = "windows")]

use rdesk_core::{MouseButton, NativeKey, PointerPosition};
use windows::Win32::Foundation::POINT;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    SendInput, INPUT, INPUT_0, INPUT_KEYBOARD, INPUT_MOUSE, KEYBDINPUT, KEYBD_EVENT_FLAGS,
    KEYEVENTF_EXTENDEDKEY, KEYEVENTF_KEYUP, MOUSEEVENTF_HWHEEL, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MIDDLEDOWN, MOUSEEVENTF_MIDDLEUP, MOUSEEVENTF_RIGHTDOWN,
    MOUSEEVENTF_RIGHTUP, MOUSEEVENTF_WHEEL, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetCursorPos, SetCursorPos};

use crate::application::emulate_input::{EmulationError, PlatformInputEmulator, WheelAxis};

/// Windows implementation of [`PlatformInputEmulator`].
#[derive(Debug, Default)]
pub struct WindowsInputEmulator;

impl WindowsInputEmulator {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformInputEmulator for WindowsInputEmulator {
    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), EmulationError> {
        // SAFETY: SetCursorPos takes plain integers and has no memory preconditions.
        unsafe { SetCursorPos(x, y) }
            .map_err(|e| EmulationError::Platform(format!("SetCursorPos({x}, {y}): {e}")))
    }

    fn cursor_position(&self) -> Result<PointerPosition, EmulationError> {
        let mut point = POINT::default();
        // SAFETY: `point` is a valid, writable POINT on the stack.
        unsafe { GetCursorPos(&mut point) }
            .map_err(|e| EmulationError::Platform(format!("GetCursorPos: {e}")))?;
        Ok(PointerPosition::new(point.x, point.y))
    }

    fn emit_mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), EmulationError> {
        let flags = match (button, pressed) {
            (MouseButton::Left, true) => MOUSEEVENTF_LEFTDOWN,
            (MouseButton::Left, false) => MOUSEEVENTF_LEFTUP,
            (MouseButton::Right, true) => MOUSEEVENTF_RIGHTDOWN,
            (MouseButton::Right, false) => MOUSEEVENTF_RIGHTUP,
            (MouseButton::Middle, true) => MOUSEEVENTF_MIDDLEDOWN,
            (MouseButton::Middle, false) => MOUSEEVENTF_MIDDLEUP,
        };
        send(mouse_input(flags, 0))
    }

    fn emit_wheel(&self, axis: WheelAxis, delta: i32) -> Result<(), EmulationError> {
        let flags = match axis {
            WheelAxis::Vertical => MOUSEEVENTF_WHEEL,
            WheelAxis::Horizontal => MOUSEEVENTF_HWHEEL,
        };
        // mouseData is a signed quantity carried in a DWORD.
        send(mouse_input(flags, delta as u32))
    }

    fn emit_key(&self, key: NativeKey, pressed: bool) -> Result<(), EmulationError> {
        send(key_input(key, pressed))
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn key_flags(key: NativeKey, pressed: bool) -> KEYBD_EVENT_FLAGS {
    let mut flags = KEYBD_EVENT_FLAGS::default();
    if key.extended {
        flags |= KEYEVENTF_EXTENDEDKEY;
    }
    if !pressed {
        flags |= KEYEVENTF_KEYUP;
    }
    flags
}

fn key_input(key: NativeKey, pressed: bool) -> INPUT {
    INPUT {
        r#type: INPUT_KEYBOARD,
        Anonymous: INPUT_0 {
            ki: KEYBDINPUT {
                wVk: VIRTUAL_KEY(u16::from(key.code)),
                wScan: 0,
                dwFlags: key_flags(key, pressed),
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn mouse_input(flags: MOUSE_EVENT_FLAGS, data: u32) -> INPUT {
    INPUT {
        r#type: INPUT_MOUSE,
        Anonymous: INPUT_0 {
            mi: MOUSEINPUT {
                dx: 0,
                dy: 0,
                mouseData: data,
                dwFlags: flags,
                time: 0,
                dwExtraInfo: 0,
            },
        },
    }
}

fn send(input: INPUT) -> Result<(), EmulationError> {
    // SAFETY: `input` is a fully initialised INPUT on the stack and the size
    // argument matches its type.
    let inserted = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
    if inserted == 1 {
        Ok(())
    } else {
        Err(EmulationError::Platform(format!(
            "SendInput inserted {inserted} of 1 events: {}",
            windows::core::Error::from_win32()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extended_key_sets_extended_flag() {
        let flags = key_flags(NativeKey { code: 0x24, extended: true }, true);
        assert!(flags.contains(KEYEVENTF_EXTENDEDKEY));
        assert!(!flags.contains(KEYEVENTF_KEYUP));
    }

    #[test]
    fn test_key_release_sets_keyup_flag() {
        let flags = key_flags(NativeKey { code: 0x41, extended: false }, false);
        assert_eq!(flags, KEYEVENTF_KEYUP);
    }

    #[test]
    fn test_negative_wheel_delta_is_twos_complement() {
        let input = mouse_input(MOUSEEVENTF_WHEEL, -120i32 as u32);
        // SAFETY: the union was written through the `mi` arm.
        let data = unsafe { input.Anonymous.mi.mouseData };
        assert_eq!(data as i32, -120);
    }
}
