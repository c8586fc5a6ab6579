//! Display geometry resolution.
//!
//! The capture region and the pointer clamp both need the display size.  It
//! is resolved once per session from an ordered list of [`GeometrySource`]s;
//! the first source that answers with a non-zero size wins.  On Windows the
//! list is the system metrics first, then the primary monitor rectangle.

use std::sync::Arc;

use rdesk_core::DisplayGeometry;
use thiserror::Error;
use tracing::{debug, warn};

/// Error type for geometry queries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// A single source could not answer.
    #[error("geometry query failed: {0}")]
    Query(String),

    /// A source answered with an unusable size.
    #[error(transparent)]
    Invalid(#[from] rdesk_core::GeometryError),

    /// Every source failed; the string lists each failure.
    #[error("display geometry unresolvable: {0}")]
    Unresolvable(String),
}

/// One way of asking the OS how big the display is.
#[cfg_attr(test, mockall::automock)]
pub trait GeometrySource: Send + Sync {
    /// Short name for log lines.
    fn name(&self) -> &'static str;

    fn query(&self) -> Result<DisplayGeometry, GeometryError>;
}

/// Tries each source in order and returns the first success.
///
/// # Errors
///
/// Returns [`GeometryError::Unresolvable`] if `sources` is empty or every
/// source failed.
pub fn resolve_geometry(sources: &[Arc<dyn GeometrySource>]) -> Result<DisplayGeometry, GeometryError> {
    let mut failures = Vec::new();

    for source in sources {
        match source.query() {
            Ok(geometry) => {
                debug!(
                    source = source.name(),
                    width = geometry.width(),
                    height = geometry.height(),
                    "display geometry resolved"
                );
                return Ok(geometry);
            }
            Err(e) => {
                warn!(source = source.name(), "geometry source failed: {e}");
                failures.push(format!("{}: {e}", source.name()));
            }
        }
    }

    if failures.is_empty() {
        failures.push("no sources configured".to_string());
    }
    Err(GeometryError::Unresolvable(failures.join("; ")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
