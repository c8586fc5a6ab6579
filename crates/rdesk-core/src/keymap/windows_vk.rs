//! Logical key identifier to Windows Virtual Key (VK) code table.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_SPACE = 0x20`).  They are "virtual" because they represent *logical* keys
//! rather than physical scan codes: pressing the letter A on any keyboard layout
//! always produces `VK_A = 0x41`.
//!
//! # How this table works
//!
//! [`LOGICAL_KEYS`] is a compile-time list of `(identifier, vk)` pairs.  The
//! identifiers are the names a browser-based operator console produces:
//! `KeyboardEvent.key` values (`"a"`, `"Enter"`, `";"`) and a subset of
//! `KeyboardEvent.code` values (`"ShiftLeft"`, `"Minus"`, `"Numpad4"`).
//! Letters are stored lowercase; the VK code is the uppercase ASCII value.
//!
//! `KeyA`/`Digit5` style codes are *not* listed here: the mapper strips the
//! structured prefix and resolves the remaining letter or digit instead.

/// Every logical identifier the agent understands, with its VK code.
pub const LOGICAL_KEYS: &[(&str, u8)] = &[
    // ── Modifiers ─────────────────────────────────────────────────────────────
    ("Shift", 0x10),
    ("ShiftLeft", 0xA0),
    ("ShiftRight", 0xA1),
    ("Control", 0x11),
    ("ControlLeft", 0xA2),
    ("ControlRight", 0xA3),
    ("Alt", 0x12),
    ("AltLeft", 0xA4),
    ("AltRight", 0xA5),
    ("Meta", 0x5B),
    ("MetaLeft", 0x5B),
    ("MetaRight", 0x5C),
    // ── Control keys ──────────────────────────────────────────────────────────
    ("CapsLock", 0x14),
    ("Tab", 0x09),
    ("Enter", 0x0D),
    ("Escape", 0x1B),
    ("Space", 0x20),
    (" ", 0x20),
    ("Backspace", 0x08),
    ("PrintScreen", 0x2C), // VK_SNAPSHOT
    ("ScrollLock", 0x91),
    ("Pause", 0x13),
    ("NumLock", 0x90),
    ("ContextMenu", 0x5D), // VK_APPS
    // ── Navigation / editing cluster ──────────────────────────────────────────
    ("Insert", 0x2D),
    ("Delete", 0x2E),
    ("Home", 0x24),
    ("End", 0x23),
    ("PageUp", 0x21),   // VK_PRIOR
    ("PageDown", 0x22), // VK_NEXT
    ("ArrowUp", 0x26),
    ("ArrowDown", 0x28),
    ("ArrowLeft", 0x25),
    ("ArrowRight", 0x27),
    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ─────────────────────────────
    ("F1", 0x70),
    ("F2", 0x71),
    ("F3", 0x72),
    ("F4", 0x73),
    ("F5", 0x74),
    ("F6", 0x75),
    ("F7", 0x76),
    ("F8", 0x77),
    ("F9", 0x78),
    ("F10", 0x79),
    ("F11", 0x7A),
    ("F12", 0x7B),
    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ────────────────────────────────
    ("a", 0x41),
    ("b", 0x42),
    ("c", 0x43),
    ("d", 0x44),
    ("e", 0x45),
    ("f", 0x46),
    ("g", 0x47),
    ("h", 0x48),
    ("i", 0x49),
    ("j", 0x4A),
    ("k", 0x4B),
    ("l", 0x4C),
    ("m", 0x4D),
    ("n", 0x4E),
    ("o", 0x4F),
    ("p", 0x50),
    ("q", 0x51),
    ("r", 0x52),
    ("s", 0x53),
    ("t", 0x54),
    ("u", 0x55),
    ("v", 0x56),
    ("w", 0x57),
    ("x", 0x58),
    ("y", 0x59),
    ("z", 0x5A),
    // ── Digit row (VK_0=0x30 … VK_9=0x39) ───────────────────────────────────
    ("0", 0x30),
    ("1", 0x31),
    ("2", 0x32),
    ("3", 0x33),
    ("4", 0x34),
    ("5", 0x35),
    ("6", 0x36),
    ("7", 0x37),
    ("8", 0x38),
    ("9", 0x39),
    // ── Punctuation (US layout OEM keys) ──────────────────────────────────────
    ("`", 0xC0),
    ("-", 0xBD),
    ("=", 0xBB),
    ("[", 0xDB),
    ("]", 0xDD),
    ("\\", 0xDC),
    (";", 0xBA),
    ("'", 0xDE),
    (",", 0xBC),
    (".", 0xBE),
    ("/", 0xBF),
    ("Backquote", 0xC0),
    ("Minus", 0xBD),
    ("Equal", 0xBB),
    ("BracketLeft", 0xDB),
    ("BracketRight", 0xDD),
    ("Backslash", 0xDC),
    ("Semicolon", 0xBA),
    ("Quote", 0xDE),
    ("Comma", 0xBC),
    ("Period", 0xBE),
    ("Slash", 0xBF),
    // ── Numpad (VK_NUMPAD0=0x60 … VK_NUMPAD9=0x69) ───────────────────────────
    ("Numpad0", 0x60),
    ("Numpad1", 0x61),
    ("Numpad2", 0x62),
    ("Numpad3", 0x63),
    ("Numpad4", 0x64),
    ("Numpad5", 0x65),
    ("Numpad6", 0x66),
    ("Numpad7", 0x67),
    ("Numpad8", 0x68),
    ("Numpad9", 0x69),
    ("NumpadMultiply", 0x6A),
    ("NumpadAdd", 0x6B),
    ("NumpadSubtract", 0x6D),
    ("NumpadDecimal", 0x6E),
];

/// VK codes that need `KEYEVENTF_EXTENDEDKEY` when injected.
///
/// Without the flag Windows maps these to their numpad twins (e.g. Home
/// becomes Numpad7 with NumLock off) or to the left-hand modifier.
pub const EXTENDED_VKS: &[u8] = &[
    0xA3, // Right Ctrl
    0xA5, // Right Alt
    0x2E, // Delete
    0x2D, // Insert
    0x24, // Home
    0x23, // End
    0x21, // PageUp
    0x22, // PageDown
    0x26, // ArrowUp
    0x28, // ArrowDown
    0x25, // ArrowLeft
    0x27, // ArrowRight
];

/// Returns `true` if `vk` must be injected with the extended-key flag.
pub fn is_extended(vk: u8) -> bool {
    EXTENDED_VKS.contains(&vk)
}
