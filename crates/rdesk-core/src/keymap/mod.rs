//! Logical key identifier translation for keyboard input injection.
//!
//! The operator console sends key names the way a browser reports them
//! (`"a"`, `"Enter"`, `"KeyA"`, `"Digit5"`).  The agent injects Windows
//! Virtual Key codes.  [`KeyMapper`] bridges the two.

pub mod windows_vk;

use std::collections::HashMap;
use std::sync::OnceLock;

use thiserror::Error;

/// A resolved native key: the Windows VK code plus the extended-key flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeKey {
    /// Windows Virtual Key code.
    pub code: u8,
    /// `true` when the key must be injected with `KEYEVENTF_EXTENDEDKEY`.
    pub extended: bool,
}

/// Errors produced by [`KeyMapper::resolve`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyMapError {
    /// No table entry matched the identifier under any resolution rule.
    #[error("no native key mapping for identifier {0:?}")]
    NotFound(String),
}

/// Immutable identifier → VK table with the resolution rules layered on top.
///
/// Build it once and share it; [`KeyMapper::shared`] returns a process-wide
/// instance.
#[derive(Debug, Clone)]
pub struct KeyMapper {
    table: HashMap<&'static str, u8>,
}

impl KeyMapper {
    /// Builds a mapper from [`windows_vk::LOGICAL_KEYS`].
    pub fn new() -> Self {
        Self {
            table: windows_vk::LOGICAL_KEYS.iter().copied().collect(),
        }
    }

    /// Returns the process-wide mapper, building it on first use.
    pub fn shared() -> &'static KeyMapper {
        static SHARED: OnceLock<KeyMapper> = OnceLock::new();
        SHARED.get_or_init(KeyMapper::new)
    }

    /// Resolves a logical key identifier to a [`NativeKey`].
    ///
    /// Rules, first match wins:
    ///
    /// 1. exact identifier (`"Enter"`, `"a"`, `";"`);
    /// 2. lowercased identifier (`"A"` → `"a"`, `"ENTER"` does **not** match
    ///    `"Enter"` because the table stores it mixed-case);
    /// 3. `Key<L>` where `L` is one ASCII letter (`"KeyA"` → `"a"`);
    /// 4. `Digit<N>` where `N` is one ASCII digit (`"Digit5"` → `"5"`).
    ///
    /// # Errors
    ///
    /// Returns [`KeyMapError::NotFound`] when none of the rules match.
    pub fn resolve(&self, identifier: &str) -> Result<NativeKey, KeyMapError> {
        self.lookup(identifier)
            .map(native)
            .ok_or_else(|| KeyMapError::NotFound(identifier.to_string()))
    }

    /// Number of identifiers in the table (excluding prefix forms).
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Iterates over every directly-listed identifier.
    pub fn identifiers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.table.keys().copied()
    }

    fn lookup(&self, identifier: &str) -> Option<u8> {
        if let Some(&vk) = self.table.get(identifier) {
            return Some(vk);
        }

        let lowered = identifier.to_lowercase();
        if let Some(&vk) = self.table.get(lowered.as_str()) {
            return Some(vk);
        }

        if let Some(rest) = identifier.strip_prefix("Key") {
            if let Some(c) = single_char(rest).filter(char::is_ascii_alphabetic) {
                let letter = c.to_ascii_lowercase().to_string();
                return self.table.get(letter.as_str()).copied();
            }
        }

        if let Some(rest) = identifier.strip_prefix("Digit") {
            if let Some(c) = single_char(rest).filter(char::is_ascii_digit) {
                return self.table.get(c.to_string().as_str()).copied();
            }
        }

        None
    }
}

impl Default for KeyMapper {
    fn default() -> Self {
        Self::new()
    }
}

fn native(code: u8) -> NativeKey {
    NativeKey {
        code,
        extended: windows_vk::is_extended(code),
    }
}

fn single_char(s: &str) -> Option<char> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
