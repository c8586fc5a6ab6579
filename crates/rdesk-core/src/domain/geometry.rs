//! Display geometry and pointer coordinate clamping.
//!
//! The agent captures and controls a single display whose origin is `(0, 0)`.
//! Every pointer coordinate handed to the native input primitive is clamped to
//! `[0, width-1] × [0, height-1]` first, so the OS never sees an off-screen
//! target no matter what the operator sends.

use thiserror::Error;

/// Errors from constructing a [`DisplayGeometry`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// One of the dimensions was zero.
    #[error("display geometry must be non-zero, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },
}

/// A pointer position in physical display pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PointerPosition {
    pub x: i32,
    pub y: i32,
}

impl PointerPosition {
    pub const ORIGIN: PointerPosition = PointerPosition { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Size of the captured display.  Both dimensions are always greater than zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayGeometry {
    width: u32,
    height: u32,
}

impl DisplayGeometry {
    /// Creates a geometry, rejecting zero-sized displays.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::ZeroDimension`] if `width` or `height` is `0`.
    pub fn new(width: u32, height: u32) -> Result<Self, GeometryError> {
        if width == 0 || height == 0 {
            return Err(GeometryError::ZeroDimension { width, height });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Largest valid x coordinate (`width - 1`).
    pub fn max_x(&self) -> i32 {
        i32::try_from(self.width - 1).unwrap_or(i32::MAX)
    }

    /// Largest valid y coordinate (`height - 1`).
    pub fn max_y(&self) -> i32 {
        i32::try_from(self.height - 1).unwrap_or(i32::MAX)
    }

    /// Clamps an arbitrary operator-supplied coordinate onto the display.
    ///
    /// Non-finite inputs (`NaN`) clamp to `0`.  Fractional inputs are
    /// truncated toward zero after clamping.
    pub fn clamp(&self, x: f64, y: f64) -> PointerPosition {
        PointerPosition {
            x: clamp_axis(x, self.max_x()),
            y: clamp_axis(y, self.max_y()),
        }
    }

    /// Clamps an integer position onto the display.
    pub fn clamp_position(&self, pos: PointerPosition) -> PointerPosition {
        PointerPosition {
            x: pos.x.clamp(0, self.max_x()),
            y: pos.y.clamp(0, self.max_y()),
        }
    }

    /// Returns `true` if `pos` already lies on the display.
    pub fn contains(&self, pos: PointerPosition) -> bool {
        (0..=self.max_x()).contains(&pos.x) && (0..=self.max_y()).contains(&pos.y)
    }
}

fn clamp_axis(value: f64, max: i32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    // `as` saturates for out-of-range floats, so huge values land on i32::MAX
    // before the clamp brings them back onto the display.
    (value.trunc() as i32).clamp(0, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> DisplayGeometry {
        DisplayGeometry::new(1920, 1080).unwrap()
    }

    #[test]
    fn test_new_rejects_zero_width() {
        // Act
        let result = DisplayGeometry::new(0, 1080);

        // Assert
        assert_eq!(
            result,
            Err(GeometryError::ZeroDimension { width: 0, height: 1080 })
        );
    }

    #[test]
    fn test_geometry_error_is_cloneable() {
        let err = DisplayGeometry::new(0, 0).unwrap_err();
        assert_eq!(err.clone(), GeometryError::ZeroDimension { width: 0, height: 0 });
    }

    #[test]
    fn test_new_rejects_zero_height() {
        assert!(DisplayGeometry::new(1920, 0).is_err());
    }

    #[test]
    fn test_clamp_inside_is_unchanged() {
        assert_eq!(geom().clamp(100.0, 200.0), PointerPosition::new(100, 200));
    }

    #[test]
    fn test_clamp_negative_goes_to_zero() {
        assert_eq!(geom().clamp(-50.0, -1.0), PointerPosition::ORIGIN);
    }

    #[test]
    fn test_clamp_beyond_edge_goes_to_last_pixel() {
        // Arrange
        let g = geom();

        // Act
        let p = g.clamp(5000.0, 1080.0);

        // Assert
        assert_eq!(p, PointerPosition::new(1919, 1079));
    }

    #[test]
    fn test_clamp_truncates_fractions() {
        assert_eq!(geom().clamp(10.9, 20.2), PointerPosition::new(10, 20));
    }

    #[test]
    fn test_clamp_nan_and_infinity() {
        let g = geom();
        assert_eq!(g.clamp(f64::NAN, f64::INFINITY), PointerPosition::new(0, 1079));
        assert_eq!(g.clamp(f64::NEG_INFINITY, 3.0), PointerPosition::new(0, 3));
    }

    #[test]
    fn test_one_pixel_display_clamps_everything_to_origin() {
        let g = DisplayGeometry::new(1, 1).unwrap();
        assert_eq!(g.clamp(99.0, 99.0), PointerPosition::ORIGIN);
        assert!(g.contains(PointerPosition::ORIGIN));
    }

    #[test]
    fn test_clamp_position_and_contains() {
        let g = geom();
        let p = g.clamp_position(PointerPosition::new(-3, 4000));
        assert_eq!(p, PointerPosition::new(0, 1079));
        assert!(g.contains(p));
        assert!(!g.contains(PointerPosition::new(1920, 0)));
    }
}
