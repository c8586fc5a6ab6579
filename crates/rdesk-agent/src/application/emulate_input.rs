//! InputSynthesizer: turns operator intent into native input events.
//!
//! This use case sits at the application layer and delegates to a
//! [`PlatformInputEmulator`] trait object for OS-level event injection.
//! The platform-specific implementations are in the infrastructure layer.
//!
//! The synthesizer also owns the *pointer tracker*: the last coordinate it
//! actually handed to the OS.  Smoothed motion interpolates from there, so the
//! tracker is updated after every successful native call and equals the
//! target once a motion completes.

use std::sync::Arc;
use std::time::Duration;

use rdesk_core::{DisplayGeometry, KeyMapError, KeyMapper, MouseButton, NativeKey, PointerPosition};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

/// Wheel units per notch (Windows `WHEEL_DELTA`).
pub const WHEEL_DELTA: i32 = 120;

/// Lower bound for the press → release gap of a click.
pub const MIN_CLICK_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Error)]
pub enum EmulationError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error(transparent)]
    UnmappedKey(#[from] KeyMapError),
    #[error("no session geometry; pointer commands are unavailable")]
    NotInitialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WheelAxis {
    Vertical,
    Horizontal,
}

/// Native input injection.  Coordinates are physical pixels on the captured
/// display.
pub trait PlatformInputEmulator: Send + Sync {
    fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), EmulationError>;

    fn cursor_position(&self) -> Result<PointerPosition, EmulationError>;

    /// Presses or releases a mouse button at the current cursor position.
    fn emit_mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), EmulationError>;

    /// Emits one wheel event of `delta` units (positive = up / right).
    fn emit_wheel(&self, axis: WheelAxis, delta: i32) -> Result<(), EmulationError>;

    fn emit_key(&self, key: NativeKey, pressed: bool) -> Result<(), EmulationError>;
}

/// Timing for smoothed motion and clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSettings {
    /// Total time a smoothed move takes.
    pub duration: Duration,
    /// Number of intermediate steps; the sleep between steps is
    /// `duration / steps`.
    pub steps: u32,
    /// Gap between button press and release.  Never below [`MIN_CLICK_DELAY`].
    pub click_delay: Duration,
}

impl Default for MotionSettings {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(50),
            steps: 5,
            click_delay: MIN_CLICK_DELAY,
        }
    }
}

impl MotionSettings {
    /// Sleep between interpolation steps, at least 1 ms.
    pub fn step_interval(&self) -> Duration {
        (self.duration / self.steps.max(1)).max(Duration::from_millis(1))
    }
}

/// Owned by the lifecycle task; commands are executed one at a time, so the
/// pointer tracker needs no lock.
pub struct InputSynthesizer {
    emulator: Arc<dyn PlatformInputEmulator>,
    keys: &'static KeyMapper,
    geometry: Option<DisplayGeometry>,
    pointer: PointerPosition,
    motion: MotionSettings,
}

impl InputSynthesizer {
    /// Creates a synthesizer with no session.  Pointer commands fail with
    /// [`EmulationError::NotInitialized`] until [`begin_session`](Self::begin_session).
    pub fn new(emulator: Arc<dyn PlatformInputEmulator>, motion: MotionSettings) -> Self {
        Self {
            emulator,
            keys: KeyMapper::shared(),
            geometry: None,
            pointer: PointerPosition::ORIGIN,
            motion,
        }
    }

    /// Installs the session geometry and seeds the pointer tracker from the
    /// host cursor.
    ///
    /// If the cursor cannot be read the tracker starts at the origin.  Returns
    /// the seeded position.
    pub fn begin_session(&mut self, geometry: DisplayGeometry) -> PointerPosition {
        let seed = match self.emulator.cursor_position() {
            Ok(pos) => geometry.clamp_position(pos),
            Err(e) => {
                warn!("could not read cursor position, assuming origin: {e}");
                PointerPosition::ORIGIN
            }
        };
        self.geometry = Some(geometry);
        self.pointer = seed;
        seed
    }

    /// Drops the session geometry.  Pointer commands fail until the next
    /// [`begin_session`](Self::begin_session).
    pub fn end_session(&mut self) {
        self.geometry = None;
    }

    /// Last coordinate sent to the OS.
    pub fn pointer(&self) -> PointerPosition {
        self.pointer
    }

    pub fn geometry(&self) -> Option<DisplayGeometry> {
        self.geometry
    }

    /// Moves the pointer to `(x, y)`, clamped onto the display.
    ///
    /// With `smooth == false`, or when the clamped target equals the tracked
    /// position, this is exactly one native call.  Otherwise the pointer is
    /// walked along a straight line over [`MotionSettings::duration`] and the
    /// exact target is always sent last.
    ///
    /// # Errors
    ///
    /// [`EmulationError::NotInitialized`] before a session; otherwise the
    /// first native failure, which stops the motion where it is.
    pub async fn move_to(&mut self, x: f64, y: f64, smooth: bool) -> Result<(), EmulationError> {
        let geometry = self.geometry.ok_or(EmulationError::NotInitialized)?;
        let target = geometry.clamp(x, y);
        let start = self.pointer;

        if !smooth || target == start {
            return self.jump(target);
        }

        let duration = self.motion.duration;
        let interval = self.motion.step_interval();
        let began = Instant::now();

        loop {
            let progress = if duration.is_zero() {
                1.0
            } else {
                (began.elapsed().as_secs_f64() / duration.as_secs_f64()).min(1.0)
            };
            if progress >= 1.0 {
                break;
            }
            self.jump(interpolate(start, target, progress))?;
            sleep(interval).await;
        }

        self.jump(target)
    }

    /// Presses and releases `button` at the current position.
    ///
    /// Needs a session: before one, the pointer tracker is unseeded and the
    /// click would land wherever the host cursor happens to be.
    pub async fn click(&mut self, button: MouseButton) -> Result<(), EmulationError> {
        self.require_session()?;
        self.emulator.emit_mouse_button(button, true)?;
        sleep(self.motion.click_delay.max(MIN_CLICK_DELAY)).await;
        self.emulator.emit_mouse_button(button, false)?;
        debug!(%button, "click");
        Ok(())
    }

    /// Presses the key named by `identifier`.
    ///
    /// # Errors
    ///
    /// [`EmulationError::UnmappedKey`] without any native call if the
    /// identifier does not resolve.
    pub async fn key_down(&mut self, identifier: &str) -> Result<(), EmulationError> {
        let key = self.keys.resolve(identifier)?;
        self.emulator.emit_key(key, true)
    }

    pub async fn key_up(&mut self, identifier: &str) -> Result<(), EmulationError> {
        let key = self.keys.resolve(identifier)?;
        self.emulator.emit_key(key, false)
    }

    /// Scrolls by `dx`/`dy` notches.  Vertical is sent first and is inverted
    /// (operator `dy > 0` scrolls down); horizontal is not.
    pub async fn scroll(&mut self, dx: f64, dy: f64) -> Result<(), EmulationError> {
        self.require_session()?;
        if let Some(units) = wheel_units(-dy) {
            self.emulator.emit_wheel(WheelAxis::Vertical, units)?;
        }
        if let Some(units) = wheel_units(dx) {
            self.emulator.emit_wheel(WheelAxis::Horizontal, units)?;
        }
        Ok(())
    }

    // ── Internal helpers ──────────────────────────────────────────────────────

    fn require_session(&self) -> Result<DisplayGeometry, EmulationError> {
        self.geometry.ok_or(EmulationError::NotInitialized)
    }

    fn jump(&mut self, pos: PointerPosition) -> Result<(), EmulationError> {
        self.emulator.set_cursor_position(pos.x, pos.y)?;
        self.pointer = pos;
        Ok(())
    }
}

fn interpolate(start: PointerPosition, target: PointerPosition, progress: f64) -> PointerPosition {
    let axis = |a: i32, b: i32| (f64::from(a) + f64::from(b - a) * progress) as i32;
    PointerPosition {
        x: axis(start.x, target.x),
        y: axis(start.y, target.y),
    }
}

// Saturates at the i32 range.  None for NaN or anything under one unit.
fn wheel_units(notches: f64) -> Option<i32> {
    let units = (notches * f64::from(WHEEL_DELTA))
        .clamp(f64::from(i32::MIN), f64::from(i32::MAX))
        .trunc();
    if units.is_nan() || units == 0.0 {
        return None;
    }
    Some(units as i32)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // ── Mock emulator ─────────────────────────────────────────────────────────

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Move(i32, i32),
        Button(MouseButton, bool),
        Wheel(WheelAxis, i32),
        Key(NativeKey, bool),
    }

    #[derive(Default)]
    struct RecordingEmulator {
        calls: Mutex<Vec<Call>>,
        cursor: Mutex<Option<PointerPosition>>,
        should_fail: bool,
    }

    impl RecordingEmulator {
        fn record(&self, call: Call) -> Result<(), EmulationError> {
            if self.should_fail {
                return Err(EmulationError::Platform("injected failure".to_string()));
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn moves(&self) -> Vec<(i32, i32)> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Move(x, y) => Some((x, y)),
                    _ => None,
                })
                .collect()
        }
    }

    impl PlatformInputEmulator for RecordingEmulator {
        fn set_cursor_position(&self, x: i32, y: i32) -> Result<(), EmulationError> {
            self.record(Call::Move(x, y))
        }

        fn cursor_position(&self) -> Result<PointerPosition, EmulationError> {
            self.cursor
                .lock()
                .unwrap()
                .ok_or_else(|| EmulationError::Platform("no cursor".to_string()))
        }

        fn emit_mouse_button(&self, button: MouseButton, pressed: bool) -> Result<(), EmulationError> {
            self.record(Call::Button(button, pressed))
        }

        fn emit_wheel(&self, axis: WheelAxis, delta: i32) -> Result<(), EmulationError> {
            self.record(Call::Wheel(axis, delta))
        }

        fn emit_key(&self, key: NativeKey, pressed: bool) -> Result<(), EmulationError> {
            self.record(Call::Key(key, pressed))
        }
    }

    fn geometry() -> DisplayGeometry {
        DisplayGeometry::new(1920, 1080).unwrap()
    }

    fn synth_with(emulator: Arc<RecordingEmulator>) -> InputSynthesizer {
        let mut s = InputSynthesizer::new(emulator, MotionSettings::default());
        s.begin_session(geometry());
        s
    }

    // ── Session ───────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_pointer_commands_before_session_are_not_initialized() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = InputSynthesizer::new(emulator.clone(), MotionSettings::default());

        // Act
        let mv = s.move_to(10.0, 10.0, false).await;
        let click = s.click(MouseButton::Left).await;
        let scroll = s.scroll(0.0, 1.0).await;

        // Assert
        assert!(matches!(mv, Err(EmulationError::NotInitialized)));
        assert!(matches!(click, Err(EmulationError::NotInitialized)));
        assert!(matches!(scroll, Err(EmulationError::NotInitialized)));
        assert!(emulator.calls().is_empty());
    }

    #[test]
    fn test_begin_session_seeds_pointer_from_host_cursor() {
        let emulator = Arc::new(RecordingEmulator::default());
        *emulator.cursor.lock().unwrap() = Some(PointerPosition::new(4000, 300));
        let mut s = InputSynthesizer::new(emulator, MotionSettings::default());

        let seeded = s.begin_session(geometry());

        assert_eq!(seeded, PointerPosition::new(1919, 300));
        assert_eq!(s.pointer(), seeded);
    }

    #[test]
    fn test_begin_session_falls_back_to_origin() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = InputSynthesizer::new(emulator, MotionSettings::default());
        assert_eq!(s.begin_session(geometry()), PointerPosition::ORIGIN);
    }

    // ── Motion ────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_direct_move_is_one_clamped_call() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.move_to(-20.0, 99999.0, false).await.unwrap();

        // Assert
        assert_eq!(emulator.moves(), vec![(0, 1079)]);
        assert_eq!(s.pointer(), PointerPosition::new(0, 1079));
    }

    #[tokio::test]
    async fn test_non_finite_and_huge_targets_are_clamped() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.move_to(f64::NAN, f64::NAN, false).await.unwrap();
        s.move_to(1e300, -1e300, false).await.unwrap();
        s.move_to(f64::INFINITY, f64::NEG_INFINITY, false).await.unwrap();

        // Assert
        assert_eq!(emulator.moves(), vec![(0, 0), (1919, 0), (1919, 0)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_after_huge_move_stays_on_display() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        s.move_to(-1e12, 1e12, true).await.unwrap();
        s.click(MouseButton::Left).await.unwrap();

        for (x, y) in emulator.moves() {
            assert!((0..=1919).contains(&x) && (0..=1079).contains(&y), "({x}, {y})");
        }
        assert_eq!(s.pointer(), PointerPosition::new(0, 1079));
        assert_eq!(
            emulator.calls().last(),
            Some(&Call::Button(MouseButton::Left, false))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_smooth_move_interpolates_and_ends_on_target() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.move_to(100.0, 50.0, true).await.unwrap();

        // Assert
        let moves = emulator.moves();
        assert!(moves.len() >= 2, "expected intermediate points, got {moves:?}");
        assert_eq!(moves.first(), Some(&(0, 0)));
        assert_eq!(moves.last(), Some(&(100, 50)));
        for pair in moves.windows(2) {
            assert!(pair[1].0 >= pair[0].0, "x must not go backwards: {moves:?}");
        }
        assert_eq!(s.pointer(), PointerPosition::new(100, 50));
    }

    #[tokio::test(start_paused = true)]
    async fn test_smooth_move_takes_configured_duration() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator);

        let began = Instant::now();
        s.move_to(500.0, 500.0, true).await.unwrap();

        let elapsed = began.elapsed();
        assert!(elapsed >= Duration::from_millis(50), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(70), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_smooth_move_out_of_bounds_clamps_every_point() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        s.move_to(5000.0, -5000.0, true).await.unwrap();

        for (x, y) in emulator.moves() {
            assert!((0..=1919).contains(&x) && (0..=1079).contains(&y));
        }
        assert_eq!(emulator.moves().last(), Some(&(1919, 0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_same_target_is_single_direct_call() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());
        s.move_to(300.0, 300.0, true).await.unwrap();
        let before = emulator.moves().len();

        // Act
        s.move_to(300.0, 300.0, true).await.unwrap();

        // Assert
        assert_eq!(emulator.moves().len(), before + 1);
    }

    #[tokio::test]
    async fn test_failed_move_leaves_pointer_untouched() {
        let emulator = Arc::new(RecordingEmulator {
            should_fail: true,
            ..Default::default()
        });
        let mut s = synth_with(emulator);

        let result = s.move_to(10.0, 10.0, false).await;

        assert!(matches!(result, Err(EmulationError::Platform(_))));
        assert_eq!(s.pointer(), PointerPosition::ORIGIN);
    }

    #[test]
    fn test_step_interval_has_one_ms_floor() {
        let m = MotionSettings {
            duration: Duration::from_millis(3),
            steps: 10,
            ..Default::default()
        };
        assert_eq!(m.step_interval(), Duration::from_millis(1));
        assert_eq!(MotionSettings::default().step_interval(), Duration::from_millis(10));
    }

    // ── Buttons, keys, wheel ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_click_is_press_then_release() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        let began = Instant::now();
        s.click(MouseButton::Right).await.unwrap();

        assert_eq!(
            emulator.calls(),
            vec![
                Call::Button(MouseButton::Right, true),
                Call::Button(MouseButton::Right, false)
            ]
        );
        assert!(began.elapsed() >= MIN_CLICK_DELAY);
    }

    #[tokio::test]
    async fn test_key_down_carries_extended_flag() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.key_down("ArrowUp").await.unwrap();
        s.key_up("KeyA").await.unwrap();

        // Assert
        assert_eq!(
            emulator.calls(),
            vec![
                Call::Key(NativeKey { code: 0x26, extended: true }, true),
                Call::Key(NativeKey { code: 0x41, extended: false }, false),
            ]
        );
    }

    #[tokio::test]
    async fn test_unmapped_key_makes_no_native_call() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        let result = s.key_down("Hyper").await;

        assert!(matches!(result, Err(EmulationError::UnmappedKey(_))));
        assert!(emulator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_inverts_vertical_only() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.scroll(2.0, 1.0).await.unwrap();

        // Assert – vertical first
        assert_eq!(
            emulator.calls(),
            vec![
                Call::Wheel(WheelAxis::Vertical, -120),
                Call::Wheel(WheelAxis::Horizontal, 240),
            ]
        );
    }

    #[tokio::test]
    async fn test_scroll_huge_deltas_saturate_without_wrapping() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.scroll(1e10, -1e10).await.unwrap();
        s.scroll(-1e10, 1e10).await.unwrap();

        // Assert – operator dy < 0 scrolls up, so the vertical sign flips
        assert_eq!(
            emulator.calls(),
            vec![
                Call::Wheel(WheelAxis::Vertical, i32::MAX),
                Call::Wheel(WheelAxis::Horizontal, i32::MAX),
                Call::Wheel(WheelAxis::Vertical, i32::MIN),
                Call::Wheel(WheelAxis::Horizontal, i32::MIN),
            ]
        );
    }

    #[tokio::test]
    async fn test_scroll_nan_sends_nothing() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        s.scroll(f64::NAN, f64::NAN).await.unwrap();

        assert!(emulator.calls().is_empty());
    }

    #[tokio::test]
    async fn test_scroll_fractional_notches_scale_wheel_delta() {
        // Arrange
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());

        // Act
        s.scroll(0.5, -0.5).await.unwrap();

        // Assert
        assert_eq!(
            emulator.calls(),
            vec![
                Call::Wheel(WheelAxis::Vertical, 60),
                Call::Wheel(WheelAxis::Horizontal, 60),
            ]
        );
    }

    #[tokio::test]
    async fn test_zero_scroll_sends_nothing() {
        let emulator = Arc::new(RecordingEmulator::default());
        let mut s = synth_with(emulator.clone());
        s.scroll(0.0, 0.0).await.unwrap();
        assert!(emulator.calls().is_empty());
    }
}
