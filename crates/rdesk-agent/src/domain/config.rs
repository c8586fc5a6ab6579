//! Agent configuration.
//!
//! [`AgentConfig`] is the single source of truth for runtime settings.  It is
//! assembled in three layers, later layers overriding earlier ones:
//!
//! 1. built-in defaults ([`AgentConfig::default`]),
//! 2. an optional TOML file ([`AgentConfig::from_toml_file`]),
//! 3. CLI flags and environment variables (applied in `main.rs`).
//!
//! Example file:
//!
//! ```toml
//! server_url = "wss://relay.example.net/agent"
//! token = "correct horse battery staple"
//! fps = 8
//! jpeg_quality = 60
//! ```
//!
//! Fields absent from the file keep their defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error type for loading and validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error reading config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// `server_url` is not a URL at all.
    #[error("invalid server URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// `server_url` parsed but is not a WebSocket URL.
    #[error("server URL scheme must be ws or wss, got {0:?}")]
    UnsupportedScheme(String),

    /// No access token configured.
    #[error("access token is empty; set --token or REMOTE_ACCESS_PASSWORD")]
    MissingToken,

    /// A numeric setting is outside its allowed range.
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}

/// All runtime configuration for the agent.
///
/// | Field                  | Default                     |
/// |------------------------|-----------------------------|
/// | server_url             | `ws://127.0.0.1:5000/agent` |
/// | token                  | empty (must be supplied)    |
/// | fps                    | 10                          |
/// | jpeg_quality           | 70                          |
/// | move_duration_ms       | 50                          |
/// | move_steps             | 5                           |
/// | reconnect_delay_secs   | 3                           |
/// | connect_timeout_secs   | 10                          |
/// | log_level              | `info`                      |
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    /// Shared secret presented in `register_client`.  Never logged.
    #[serde(default)]
    pub token: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,
    #[serde(default = "default_move_duration_ms")]
    pub move_duration_ms: u64,
    #[serde(default = "default_move_steps")]
    pub move_steps: u32,
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_server_url() -> String {
    "ws://127.0.0.1:5000/agent".to_string()
}
fn default_fps() -> u32 {
    10
}
fn default_jpeg_quality() -> u8 {
    70
}
fn default_move_duration_ms() -> u64 {
    50
}
fn default_move_steps() -> u32 {
    5
}
fn default_reconnect_delay_secs() -> u64 {
    3
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            token: String::new(),
            fps: default_fps(),
            jpeg_quality: default_jpeg_quality(),
            move_duration_ms: default_move_duration_ms(),
            move_steps: default_move_steps(),
            reconnect_delay_secs: default_reconnect_delay_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            log_level: default_log_level(),
        }
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.token.is_empty() { "<unset>" } else { "***" };
        f.debug_struct("AgentConfig")
            .field("server_url", &self.server_url)
            .field("token", &token)
            .field("fps", &self.fps)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("move_duration_ms", &self.move_duration_ms)
            .field("move_steps", &self.move_steps)
            .field("reconnect_delay_secs", &self.reconnect_delay_secs)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl AgentConfig {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] on malformed TOML or wrongly-typed fields.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is not valid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks every field against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.server_url).map_err(|source| ConfigError::InvalidUrl {
            url: self.server_url.clone(),
            source,
        })?;
        if !matches!(url.scheme(), "ws" | "wss") {
            return Err(ConfigError::UnsupportedScheme(url.scheme().to_string()));
        }
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        check_range("fps", u64::from(self.fps), 1, 60)?;
        check_range("jpeg_quality", u64::from(self.jpeg_quality), 1, 100)?;
        check_range("move_steps", u64::from(self.move_steps), 1, u64::from(u32::MAX))?;
        Ok(())
    }

    pub fn move_duration(&self) -> Duration {
        Duration::from_millis(self.move_duration_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn check_range(field: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AgentConfig {
        AgentConfig {
            token: "s3cret".to_string(),
            ..AgentConfig::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_table() {
        // Arrange / Act
        let cfg = AgentConfig::default();

        // Assert
        assert_eq!(cfg.server_url, "ws://127.0.0.1:5000/agent");
        assert_eq!(cfg.fps, 10);
        assert_eq!(cfg.jpeg_quality, 70);
        assert_eq!(cfg.move_duration(), Duration::from_millis(50));
        assert_eq!(cfg.move_steps, 5);
        assert_eq!(cfg.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(cfg.connect_timeout(), Duration::from_secs(10));
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        // Arrange
        let text = r#"
            server_url = "wss://relay.example.net/agent"
            token = "abc"
            fps = 5
        "#;

        // Act
        let cfg = AgentConfig::from_toml_str(text).unwrap();

        // Assert
        assert_eq!(cfg.server_url, "wss://relay.example.net/agent");
        assert_eq!(cfg.fps, 5);
        assert_eq!(cfg.jpeg_quality, 70);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_bad_toml_is_parse_error() {
        let err = AgentConfig::from_toml_str("fps = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = AgentConfig::from_toml_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_validate_rejects_empty_token() {
        assert!(matches!(
            AgentConfig::default().validate(),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn test_validate_rejects_http_scheme() {
        let cfg = AgentConfig {
            server_url: "http://127.0.0.1:5000".to_string(),
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::UnsupportedScheme(s)) if s == "http"));
    }

    #[test]
    fn test_validate_rejects_unparseable_url() {
        let cfg = AgentConfig {
            server_url: "not a url".to_string(),
            ..valid()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidUrl { .. })));
    }

    #[test]
    fn test_validate_fps_bounds() {
        for (fps, ok) in [(0, false), (1, true), (60, true), (61, false)] {
            let cfg = AgentConfig { fps, ..valid() };
            assert_eq!(cfg.validate().is_ok(), ok, "fps={fps}");
        }
    }

    #[test]
    fn test_validate_quality_and_steps() {
        let cfg = AgentConfig {
            jpeg_quality: 0,
            ..valid()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { field: "jpeg_quality", .. })
        ));

        let cfg = AgentConfig {
            move_steps: 0,
            ..valid()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange { field: "move_steps", .. })
        ));
    }

    #[test]
    fn test_debug_masks_token() {
        let dbg = format!("{:?}", valid());
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("***"));
    }
}
