//! Validation of operator commands.
//!
//! A [`CommandPayload`] is whatever JSON the operator console sent.  This
//! module turns it into a [`Command`], a tagged variant whose fields are
//! guaranteed present, or explains why it cannot.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::protocol::messages::CommandPayload;

/// Reasons a command payload is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("command has no action")]
    MissingAction,

    #[error("unknown command action {0:?}")]
    UnknownAction(String),

    #[error("command {action:?} is missing field {field:?}")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },

    #[error("unknown mouse button {0:?}")]
    UnknownButton(String),
}

/// Mouse button named by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl FromStr for MouseButton {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(MouseButton::Left),
            "right" => Ok(MouseButton::Right),
            "middle" => Ok(MouseButton::Middle),
            other => Err(CommandError::UnknownButton(other.to_string())),
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MouseButton::Left => "left",
            MouseButton::Right => "right",
            MouseButton::Middle => "middle",
        })
    }
}

/// A validated operator command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Smoothed pointer motion to an absolute position.
    Move { x: f64, y: f64 },
    /// Button press and release, optionally preceded by a direct jump.
    Click {
        button: MouseButton,
        at: Option<(f64, f64)>,
    },
    KeyDown { identifier: String },
    KeyUp { identifier: String },
    /// Wheel motion in notches; either axis may be zero.
    Scroll { dx: f64, dy: f64 },
}

impl Command {
    /// Short action name, used in log fields.
    pub fn action(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::Click { .. } => "click",
            Command::KeyDown { .. } => "keydown",
            Command::KeyUp { .. } => "keyup",
            Command::Scroll { .. } => "scroll",
        }
    }
}

impl TryFrom<&CommandPayload> for Command {
    type Error = CommandError;

    fn try_from(p: &CommandPayload) -> Result<Self, Self::Error> {
        let action = p.action.as_deref().ok_or(CommandError::MissingAction)?;

        match action {
            "move" => {
                let x = p.x.ok_or(CommandError::MissingField {
                    action: "move",
                    field: "x",
                })?;
                let y = p.y.ok_or(CommandError::MissingField {
                    action: "move",
                    field: "y",
                })?;
                Ok(Command::Move { x, y })
            }
            "click" => {
                let button = match p.button.as_deref() {
                    Some(name) => name.parse()?,
                    None => MouseButton::Left,
                };
                // A jump happens only when both coordinates are present.
                let at = p.x.zip(p.y);
                Ok(Command::Click { button, at })
            }
            "keydown" => Ok(Command::KeyDown {
                identifier: key_identifier(p, "keydown")?,
            }),
            "keyup" => Ok(Command::KeyUp {
                identifier: key_identifier(p, "keyup")?,
            }),
            "scroll" => Ok(Command::Scroll {
                dx: p.dx.unwrap_or(0.0),
                dy: p.dy.unwrap_or(0.0),
            }),
            other => Err(CommandError::UnknownAction(other.to_string())),
        }
    }
}

/// `code` wins when non-empty, otherwise `key`.
fn key_identifier(p: &CommandPayload, action: &'static str) -> Result<String, CommandError> {
    p.code
        .as_deref()
        .filter(|c| !c.is_empty())
        .or_else(|| p.key.as_deref().filter(|k| !k.is_empty()))
        .map(str::to_string)
        .ok_or(CommandError::MissingField {
            action,
            field: "key",
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(action: &str) -> CommandPayload {
        CommandPayload {
            action: Some(action.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_move_requires_both_coordinates() {
        // Arrange
        let mut p = payload("move");
        p.x = Some(1.0);

        // Act
        let err = Command::try_from(&p).unwrap_err();

        // Assert
        assert_eq!(
            err,
            CommandError::MissingField {
                action: "move",
                field: "y"
            }
        );
    }

    #[test]
    fn test_click_defaults_to_left_without_jump() {
        let cmd = Command::try_from(&payload("click")).unwrap();
        assert_eq!(
            cmd,
            Command::Click {
                button: MouseButton::Left,
                at: None
            }
        );
    }

    #[test]
    fn test_click_with_single_coordinate_does_not_jump() {
        let mut p = payload("click");
        p.x = Some(5.0);
        let cmd = Command::try_from(&p).unwrap();
        assert!(matches!(cmd, Command::Click { at: None, .. }));
    }

    #[test]
    fn test_click_unknown_button_is_rejected() {
        let mut p = payload("click");
        p.button = Some("back".to_string());
        assert_eq!(
            Command::try_from(&p),
            Err(CommandError::UnknownButton("back".to_string()))
        );
    }

    #[test]
    fn test_key_code_preferred_over_key() {
        // Arrange
        let mut p = payload("keydown");
        p.key = Some("a".to_string());
        p.code = Some("KeyA".to_string());

        // Act
        let cmd = Command::try_from(&p).unwrap();

        // Assert
        assert_eq!(
            cmd,
            Command::KeyDown {
                identifier: "KeyA".to_string()
            }
        );
    }

    #[test]
    fn test_empty_code_falls_back_to_key() {
        let mut p = payload("keyup");
        p.key = Some("Enter".to_string());
        p.code = Some(String::new());
        assert_eq!(
            Command::try_from(&p).unwrap(),
            Command::KeyUp {
                identifier: "Enter".to_string()
            }
        );
    }

    #[test]
    fn test_key_command_without_identifier_is_rejected() {
        assert!(matches!(
            Command::try_from(&payload("keydown")),
            Err(CommandError::MissingField { field: "key", .. })
        ));
    }

    #[test]
    fn test_scroll_defaults_missing_axes_to_zero() {
        let mut p = payload("scroll");
        p.dy = Some(1.0);
        assert_eq!(
            Command::try_from(&p).unwrap(),
            Command::Scroll { dx: 0.0, dy: 1.0 }
        );
    }

    #[test]
    fn test_missing_and_unknown_action() {
        assert_eq!(
            Command::try_from(&CommandPayload::default()),
            Err(CommandError::MissingAction)
        );
        assert_eq!(
            Command::try_from(&payload("teleport")),
            Err(CommandError::UnknownAction("teleport".to_string()))
        );
    }
}
