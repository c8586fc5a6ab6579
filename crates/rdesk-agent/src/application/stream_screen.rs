//! CapturePipeline: rate-limited grab → encode → send loop.
//!
//! One pipeline runs per registered session, spawned by the lifecycle as a
//! Tokio task.  Each iteration:
//!
//! 1. waits while the session is not registered (polling every `idle_poll`);
//! 2. sleeps the remainder of the frame interval since the previous capture;
//! 3. grabs the full display as BGRA, encodes it as JPEG, base64-encodes it;
//! 4. sends `screen_data` if the session is *still* registered, otherwise
//!    drops the frame.
//!
//! Only one frame is ever in flight; nothing is queued.  Grab and encode run
//! on the blocking pool so a slow frame never stalls command handling.  Grab
//! and encode failures back off for `capture_backoff`; a send failure means the link is
//! gone, so the pipeline clears the registered flag and backs off for
//! `send_backoff`.  Every wait returns early when the cancellation token
//! fires.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rdesk_core::protocol::SequenceCounter;
use rdesk_core::{DisplayGeometry, OutboundMessage};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::application::interruptible_sleep;
use crate::application::transport::MessageSink;
use crate::domain::SessionFlags;

// ── Ports ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("screen grab failed: {0}")]
    Platform(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("frame buffer is inconsistent: {0}")]
    InvalidFrame(String),
    #[error("encoder failed: {0}")]
    Encoder(String),
}

/// Rectangle of the display to capture, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    /// The whole display: `(0, 0, width, height)`.
    pub fn full(geometry: DisplayGeometry) -> Self {
        Self {
            x: 0,
            y: 0,
            width: geometry.width(),
            height: geometry.height(),
        }
    }
}

/// Uncompressed frame, 4 bytes per pixel in B, G, R, A order, top row first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    /// Bytes per row (at least `width * 4`).
    pub stride: usize,
    pub data: Vec<u8>,
}

impl RawFrame {
    /// A frame filled with one BGRA colour.  Used by mocks and tests.
    pub fn solid(width: u32, height: u32, bgra: [u8; 4]) -> Self {
        let stride = width as usize * 4;
        let data = bgra
            .iter()
            .copied()
            .cycle()
            .take(stride * height as usize)
            .collect();
        Self {
            width,
            height,
            stride,
            data,
        }
    }
}

/// Grabs raw pixels from the display.
pub trait ScreenGrabber: Send + Sync {
    fn grab(&self, region: CaptureRegion) -> Result<RawFrame, CaptureError>;
}

/// Compresses a raw frame.
pub trait FrameEncoder: Send + Sync {
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>, EncodeError>;
}

// ── Settings & metrics ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// Target frames per second (1..=60).
    pub fps: u32,
    /// JPEG quality (1..=100).
    pub jpeg_quality: u8,
    /// Poll interval while the session is not registered.
    pub idle_poll: Duration,
    /// Wait after a grab or encode failure.
    pub capture_backoff: Duration,
    /// Wait after a send failure.
    pub send_backoff: Duration,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            fps: 10,
            jpeg_quality: 70,
            idle_poll: Duration::from_millis(500),
            capture_backoff: Duration::from_secs(1),
            send_backoff: Duration::from_secs(2),
        }
    }
}

impl CaptureSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }
}

/// Counters shared between the pipeline and its observers.
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    active: AtomicU64,
    peak: AtomicU64,
    frames_sent: AtomicU64,
    frames_dropped: AtomicU64,
    grab_failures: AtomicU64,
    encode_failures: AtomicU64,
    send_failures: AtomicU64,
}

/// Point-in-time copy of [`PipelineMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Pipeline executions currently running.
    pub active: u64,
    /// Highest `active` ever observed.
    pub peak: u64,
    pub frames_sent: u64,
    /// Frames captured but discarded because registration was lost.
    pub frames_dropped: u64,
    pub grab_failures: u64,
    pub encode_failures: u64,
    pub send_failures: u64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            active: self.active.load(Ordering::Acquire),
            peak: self.peak.load(Ordering::Acquire),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            grab_failures: self.grab_failures.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }

    fn enter(self: &Arc<Self>) -> ActiveGuard {
        let now = self.active.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak.fetch_max(now, Ordering::AcqRel);
        ActiveGuard(Arc::clone(self))
    }

    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Decrements `active` however the pipeline task ends.
struct ActiveGuard(Arc<PipelineMetrics>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::AcqRel);
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFrame {
    pub sequence: u64,
    /// When the grab started; frame age is logged against it on send.
    pub captured_at: Instant,
    /// Compressed size before base64.
    pub encoded_len: usize,
    pub image: String,
}

enum FrameError {
    Capture(CaptureError),
    Encode(EncodeError),
}

pub struct CapturePipeline {
    geometry: DisplayGeometry,
    flags: Arc<SessionFlags>,
    grabber: Arc<dyn ScreenGrabber>,
    encoder: Arc<dyn FrameEncoder>,
    sink: Arc<dyn MessageSink>,
    settings: CaptureSettings,
    metrics: Arc<PipelineMetrics>,
    sequence: SequenceCounter,
}

impl CapturePipeline {
    pub fn new(
        geometry: DisplayGeometry,
        flags: Arc<SessionFlags>,
        grabber: Arc<dyn ScreenGrabber>,
        encoder: Arc<dyn FrameEncoder>,
        sink: Arc<dyn MessageSink>,
        settings: CaptureSettings,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            geometry,
            flags,
            grabber,
            encoder,
            sink,
            settings,
            metrics,
            sequence: SequenceCounter::new(),
        }
    }

    /// Runs until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let _active = self.metrics.enter();
        let region = CaptureRegion::full(self.geometry);
        let interval = self.settings.frame_interval();
        let mut last_capture: Option<Instant> = None;

        info!(
            width = region.width,
            height = region.height,
            fps = self.settings.fps,
            "capture pipeline started"
        );

        while !cancel.is_cancelled() {
            if !self.flags.is_registered() {
                if !interruptible_sleep(&cancel, self.settings.idle_poll).await {
                    break;
                }
                continue;
            }

            if let Some(prev) = last_capture {
                if !pace(&cancel, prev, interval).await {
                    break;
                }
            }

            let started = Instant::now();
            last_capture = Some(started);

            let captured = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.capture_frame(region, started) => r,
            };
            let frame = match captured {
                Ok(frame) => frame,
                Err(FrameError::Capture(e)) => {
                    warn!("{e}; retrying in {:?}", self.settings.capture_backoff);
                    PipelineMetrics::bump(&self.metrics.grab_failures);
                    if !interruptible_sleep(&cancel, self.settings.capture_backoff).await {
                        break;
                    }
                    continue;
                }
                Err(FrameError::Encode(e)) => {
                    warn!("{e}; retrying in {:?}", self.settings.capture_backoff);
                    PipelineMetrics::bump(&self.metrics.encode_failures);
                    if !interruptible_sleep(&cancel, self.settings.capture_backoff).await {
                        break;
                    }
                    continue;
                }
            };

            if !self.flags.is_registered() {
                debug!(seq = frame.sequence, "registration lost; frame dropped");
                PipelineMetrics::bump(&self.metrics.frames_dropped);
                continue;
            }

            let seq = frame.sequence;
            let bytes = frame.encoded_len;
            let captured_at = frame.captured_at;
            let sent = tokio::select! {
                _ = cancel.cancelled() => break,
                r = self.sink.emit(OutboundMessage::screen_data(frame.image)) => r,
            };

            match sent {
                Ok(()) => {
                    PipelineMetrics::bump(&self.metrics.frames_sent);
                    debug!(seq, bytes, age = ?captured_at.elapsed(), "frame sent");
                }
                Err(e) => {
                    warn!(seq, "frame send failed: {e}; pausing capture");
                    PipelineMetrics::bump(&self.metrics.send_failures);
                    self.flags.clear_registered();
                    if !interruptible_sleep(&cancel, self.settings.send_backoff).await {
                        break;
                    }
                }
            }
        }

        info!("capture pipeline stopped");
    }

    async fn capture_frame(
        &self,
        region: CaptureRegion,
        captured_at: Instant,
    ) -> Result<EncodedFrame, FrameError> {
        let grabber = Arc::clone(&self.grabber);
        let encoder = Arc::clone(&self.encoder);
        let quality = self.settings.jpeg_quality;

        let (encoded_len, image) = tokio::task::spawn_blocking(move || {
            let raw = grabber.grab(region).map_err(FrameError::Capture)?;
            let jpeg = encoder.encode(&raw, quality).map_err(FrameError::Encode)?;
            Ok((jpeg.len(), STANDARD.encode(&jpeg)))
        })
        .await
        .map_err(|e| FrameError::Capture(CaptureError::Platform(format!("capture task failed: {e}"))))??;

        Ok(EncodedFrame {
            sequence: self.sequence.next(),
            captured_at,
            encoded_len,
            image,
        })
    }
}

/// `false` if cancelled.
async fn pace(cancel: &CancellationToken, last: Instant, interval: Duration) -> bool {
    let elapsed = last.elapsed();
    if elapsed < interval {
        return interruptible_sleep(cancel, interval - elapsed).await;
    }
    true
}

// ── Tests ─────────────────────────────────────────────────────────────────────
