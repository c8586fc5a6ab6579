//! Domain types for the agent: configuration, the connection state machine,
//! and the flags shared between the lifecycle and the capture pipeline.
//!
//! Nothing in here touches the OS, the network, or the async runtime.

pub mod config;
pub mod connection;
pub mod session;

pub use config::{AgentConfig, ConfigError};
pub use connection::{ConnectionState, ConnectionStatus, InvalidTransition, LifecycleEvent};
pub use session::SessionFlags;
