//! In-memory grabber and geometry source.
//!
//! `MockScreenGrabber` returns a solid frame of the requested size and counts
//! every call, so tests can assert that capture did (or did not) happen.
//! `FixedGeometrySource` answers a constant size, or a constant error.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use rdesk_core::DisplayGeometry;

use crate::application::display_geometry::{GeometryError, GeometrySource};
use crate::application::stream_screen::{CaptureError, CaptureRegion, RawFrame, ScreenGrabber};

/// Mid-grey, opaque.
const FILL_BGRA: [u8; 4] = [0x80, 0x80, 0x80, 0xFF];

/// A grabber that fabricates frames without touching the display.
#[derive(Debug, Default)]
pub struct MockScreenGrabber {
    grabs: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockScreenGrabber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `grab` calls so far, failed ones included.
    pub fn grab_count(&self) -> usize {
        self.grabs.load(Ordering::SeqCst)
    }

    /// Makes subsequent grabs fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::SeqCst);
    }
}

impl ScreenGrabber for MockScreenGrabber {
    fn grab(&self, region: CaptureRegion) -> Result<RawFrame, CaptureError> {
        self.grabs.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(CaptureError::Platform("mock grab failure".into()));
        }
        Ok(RawFrame::solid(region.width, region.height, FILL_BGRA))
    }
}

/// A geometry source with a canned answer.
#[derive(Debug, Clone)]
pub struct FixedGeometrySource {
    answer: Result<DisplayGeometry, GeometryError>,
}

impl FixedGeometrySource {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self { answer: Ok(geometry) }
    }

    /// A source that always fails with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            answer: Err(GeometryError::Query(reason.into())),
        }
    }
}

impl GeometrySource for FixedGeometrySource {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn query(&self) -> Result<DisplayGeometry, GeometryError> {
        self.answer.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grab_returns_frame_of_region_size() {
        // Arrange
        let grabber = MockScreenGrabber::new();
        let region = CaptureRegion {
            x: 0,
            y: 0,
            width: 8,
            height: 4,
        };

        // Act
        let frame = grabber.grab(region).unwrap();

        // Assert
        assert_eq!((frame.width, frame.height), (8, 4));
        assert_eq!(frame.data.len(), 8 * 4 * 4);
        assert_eq!(grabber.grab_count(), 1);
    }

    #[test]
    fn test_failing_grab_is_still_counted() {
        let grabber = MockScreenGrabber::new();
        grabber.set_should_fail(true);

        let region = CaptureRegion {
            x: 0,
            y: 0,
            width: 1,
            height: 1,
        };
        assert!(grabber.grab(region).is_err());
        assert_eq!(grabber.grab_count(), 1);
    }

    #[test]
    fn test_failing_source_reports_reason() {
        let source = FixedGeometrySource::failing("no display");
        assert_eq!(
            source.query(),
            Err(GeometryError::Query("no display".into()))
        );
    }
}
