//! CommandDispatcher: routes inbound `command` payloads to the synthesizer.
//!
//! The dispatcher refuses everything while the session is not registered,
//! validates the payload into a [`Command`], and executes it.  Every failure
//! is returned as a [`DispatchError`]; the lifecycle logs it and moves on.

use std::sync::Arc;

use rdesk_core::protocol::messages::CommandPayload;
use rdesk_core::{Command, CommandError};
use thiserror::Error;
use tracing::debug;

use crate::application::emulate_input::{EmulationError, InputSynthesizer};
use crate::domain::SessionFlags;

/// Why a command was not executed.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("command ignored: session is not registered")]
    NotRegistered,
    #[error("malformed command: {0}")]
    Malformed(#[from] CommandError),
    #[error("command failed: {0}")]
    Emulation(#[from] EmulationError),
}

/// Executes operator commands for one agent process.
pub struct CommandDispatcher {
    synthesizer: InputSynthesizer,
    flags: Arc<SessionFlags>,
}

impl CommandDispatcher {
    pub fn new(synthesizer: InputSynthesizer, flags: Arc<SessionFlags>) -> Self {
        Self { synthesizer, flags }
    }

    pub fn synthesizer_mut(&mut self) -> &mut InputSynthesizer {
        &mut self.synthesizer
    }

    /// Validates and executes one command payload.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::NotRegistered`] if the session is not registered.
    /// - [`DispatchError::Malformed`] if the payload does not validate.
    /// - [`DispatchError::Emulation`] if the synthesizer fails.
    pub async fn dispatch(&mut self, payload: &CommandPayload) -> Result<(), DispatchError> {
        if !self.flags.is_registered() {
            return Err(DispatchError::NotRegistered);
        }

        let command = Command::try_from(payload)?;
        debug!(action = command.action(), "executing command");

        let s = &mut self.synthesizer;
        match command {
            Command::Move { x, y } => s.move_to(x, y, true).await?,
            Command::Click { button, at } => {
                if let Some((x, y)) = at {
                    s.move_to(x, y, false).await?;
                }
                s.click(button).await?;
            }
            Command::KeyDown { identifier } => s.key_down(&identifier).await?,
            Command::KeyUp { identifier } => s.key_up(&identifier).await?,
            Command::Scroll { dx, dy } => s.scroll(dx, dy).await?,
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
