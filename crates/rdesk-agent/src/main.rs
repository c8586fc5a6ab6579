//! rdesk remote-session agent entry point.
//!
//! # Usage
//!
//! ```text
//! rdesk-agent [OPTIONS]
//!
//! Options:
//!   --config <PATH>                 TOML configuration file
//!   --server-url <URL>              Relay server WebSocket URL
//!   --token <TOKEN>                 Shared access token
//!   --fps <N>                       Capture rate [default: 10]
//!   --jpeg-quality <1-100>          JPEG quality [default: 70]
//!   --move-duration-ms <MS>         Smoothed move duration [default: 50]
//!   --move-steps <N>                Smoothed move steps [default: 5]
//!   --reconnect-delay-secs <SECS>   Backoff between attempts [default: 3]
//!   --connect-timeout-secs <SECS>   WebSocket connect timeout [default: 10]
//!   --log-level <FILTER>            Used when RUST_LOG is unset [default: info]
//! ```
//!
//! # Configuration layers
//!
//! Built-in defaults, then the TOML file, then flags / environment
//! variables.  Every flag has a `REMOTE_*` environment variable; the token
//! reads `REMOTE_ACCESS_PASSWORD`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use rdesk_agent::application::display_geometry::GeometrySource;
use rdesk_agent::application::lifecycle::{ConnectionLifecycle, LifecycleConfig, SessionServices};
use rdesk_agent::domain::AgentConfig;
use rdesk_agent::infrastructure::encoder::JpegFrameEncoder;
use rdesk_agent::infrastructure::network::WebSocketTransport;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Streams this machine's screen to a relay server and replays remote input.
///
/// Flags left unset fall back to the config file, then to built-in defaults.
#[derive(Debug, Default, Parser)]
#[command(name = "rdesk-agent", about = "Remote-session agent", version)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, env = "REMOTE_CONFIG")]
    config: Option<PathBuf>,

    /// Relay server URL (`ws://` or `wss://`).
    #[arg(long, env = "REMOTE_SERVER_URL")]
    server_url: Option<String>,

    /// Shared access token sent in `register_client`.
    #[arg(long, env = "REMOTE_ACCESS_PASSWORD", hide_env_values = true)]
    token: Option<String>,

    #[arg(long, env = "REMOTE_FPS")]
    fps: Option<u32>,

    #[arg(long, env = "REMOTE_JPEG_QUALITY")]
    jpeg_quality: Option<u8>,

    #[arg(long, env = "REMOTE_MOVE_DURATION_MS")]
    move_duration_ms: Option<u64>,

    #[arg(long, env = "REMOTE_MOVE_STEPS")]
    move_steps: Option<u32>,

    #[arg(long, env = "REMOTE_RECONNECT_DELAY_SECS")]
    reconnect_delay_secs: Option<u64>,

    #[arg(long, env = "REMOTE_CONNECT_TIMEOUT_SECS")]
    connect_timeout_secs: Option<u64>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Layers the config file (if any) and these flags over the defaults,
    /// then validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the final
    /// configuration fails [`AgentConfig::validate`].
    fn into_agent_config(self) -> anyhow::Result<AgentConfig> {
        let mut config = match &self.config {
            Some(path) => AgentConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AgentConfig::default(),
        };

        if let Some(v) = self.server_url {
            config.server_url = v;
        }
        if let Some(v) = self.token {
            config.token = v;
        }
        if let Some(v) = self.fps {
            config.fps = v;
        }
        if let Some(v) = self.jpeg_quality {
            config.jpeg_quality = v;
        }
        if let Some(v) = self.move_duration_ms {
            config.move_duration_ms = v;
        }
        if let Some(v) = self.move_steps {
            config.move_steps = v;
        }
        if let Some(v) = self.reconnect_delay_secs {
            config.reconnect_delay_secs = v;
        }
        if let Some(v) = self.connect_timeout_secs {
            config.connect_timeout_secs = v;
        }
        if let Some(v) = self.log_level {
            config.log_level = v;
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Platform services ─────────────────────────────────────────────────────────

#[cfg(target_os = "windows")]
fn platform_services() -> SessionServices {
    use rdesk_agent::infrastructure::input_emulation::windows::WindowsInputEmulator;
    use rdesk_agent::infrastructure::screen_capture::windows::{
        GdiScreenGrabber, PrimaryMonitorGeometry, SystemMetricsGeometry,
    };

    let geometry_sources: Vec<Arc<dyn GeometrySource>> = vec![
        Arc::new(SystemMetricsGeometry),
        Arc::new(PrimaryMonitorGeometry),
    ];
    SessionServices {
        emulator: Arc::new(WindowsInputEmulator::new()),
        geometry_sources,
        grabber: Arc::new(GdiScreenGrabber::new()),
        encoder: Arc::new(JpegFrameEncoder::new()),
    }
}

#[cfg(not(target_os = "windows"))]
fn platform_services() -> SessionServices {
    use rdesk_agent::infrastructure::input_emulation::mock::MockInputEmulator;
    use rdesk_agent::infrastructure::screen_capture::mock::{
        FixedGeometrySource, MockScreenGrabber,
    };
    use rdesk_core::DisplayGeometry;

    tracing::warn!("no native input or capture backend on this platform; using in-memory stand-ins");
    let geometry_sources: Vec<Arc<dyn GeometrySource>> = match DisplayGeometry::new(1280, 720) {
        Ok(geometry) => vec![Arc::new(FixedGeometrySource::new(geometry))],
        Err(e) => vec![Arc::new(FixedGeometrySource::failing(e.to_string()))],
    };
    SessionServices {
        emulator: Arc::new(MockInputEmulator::new()),
        geometry_sources,
        grabber: Arc::new(MockScreenGrabber::new()),
        encoder: Arc::new(JpegFrameEncoder::new()),
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_agent_config()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str())),
        )
        .init();

    info!(
        server = %config.server_url,
        fps = config.fps,
        quality = config.jpeg_quality,
        "rdesk agent starting"
    );

    let shutdown = CancellationToken::new();
    let ctrl_c_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                ctrl_c_token.cancel();
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    let transport = Arc::new(WebSocketTransport::new(config.connect_timeout()));
    let lifecycle = ConnectionLifecycle::new(
        LifecycleConfig::from(&config),
        transport,
        platform_services(),
        shutdown,
    );
    lifecycle.run().await;

    info!("rdesk agent stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
