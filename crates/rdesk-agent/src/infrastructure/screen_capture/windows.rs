//! Windows screen capture via GDI and display size via `GetSystemMetrics` /
//! `GetMonitorInfoW`.
//!
//! Each grab acquires the screen DC, blits into a compatible bitmap and reads
//! the pixels back with `GetDIBits` as top-down 32-bit BGRA.  All GDI handles
//! are released before `grab` returns, on success and on failure.

#![cfg(target_os = "windows")]

use rdesk_core::DisplayGeometry;
use windows::Win32::Foundation::{HWND, POINT};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    GetMonitorInfoW, MonitorFromPoint, ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER,
    BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC, HGDIOBJ, MONITORINFO, MONITOR_DEFAULTTOPRIMARY, SRCCOPY,
};
use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

use crate::application::display_geometry::{GeometryError, GeometrySource};
use crate::application::stream_screen::{CaptureError, CaptureRegion, RawFrame, ScreenGrabber};

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Primary display size from `SM_CXSCREEN` / `SM_CYSCREEN`.
#[derive(Debug, Default)]
pub struct SystemMetricsGeometry;

impl GeometrySource for SystemMetricsGeometry {
    fn name(&self) -> &'static str {
        "system-metrics"
    }

    fn query(&self) -> Result<DisplayGeometry, GeometryError> {
        // SAFETY: GetSystemMetrics has no preconditions.
        let (w, h) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        if w <= 0 || h <= 0 {
            return Err(GeometryError::Query(format!("GetSystemMetrics returned {w}x{h}")));
        }
        Ok(DisplayGeometry::new(w as u32, h as u32)?)
    }
}

/// Primary display size from the monitor rectangle that contains `(0, 0)`.
#[derive(Debug, Default)]
pub struct PrimaryMonitorGeometry;

impl GeometrySource for PrimaryMonitorGeometry {
    fn name(&self) -> &'static str {
        "primary-monitor"
    }

    fn query(&self) -> Result<DisplayGeometry, GeometryError> {
        let mut info = MONITORINFO {
            cbSize: std::mem::size_of::<MONITORINFO>() as u32,
            ..Default::default()
        };
        // SAFETY: MonitorFromPoint with DEFAULTTOPRIMARY always yields a valid
        // handle; `info` is writable and its cbSize is set.
        let ok = unsafe {
            let monitor = MonitorFromPoint(POINT { x: 0, y: 0 }, MONITOR_DEFAULTTOPRIMARY);
            GetMonitorInfoW(monitor, &mut info)
        };
        if !ok.as_bool() {
            return Err(GeometryError::Query("GetMonitorInfoW failed".into()));
        }
        let rc = info.rcMonitor;
        let (w, h) = (rc.right - rc.left, rc.bottom - rc.top);
        if w <= 0 || h <= 0 {
            return Err(GeometryError::Query(format!("monitor rectangle is {w}x{h}")));
        }
        Ok(DisplayGeometry::new(w as u32, h as u32)?)
    }
}

// ── Capture ───────────────────────────────────────────────────────────────────

/// GDI screen grabber.  Holds no handles between calls.
#[derive(Debug, Default)]
pub struct GdiScreenGrabber;

impl GdiScreenGrabber {
    pub fn new() -> Self {
        Self
    }
}

/// Releases the GDI objects of one grab in reverse order of acquisition.
struct GdiResources {
    screen: HDC,
    memory: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
}

impl Drop for GdiResources {
    fn drop(&mut self) {
        // SAFETY: every handle was obtained in `grab` and is released exactly once.
        unsafe {
            if !self.previous.is_invalid() {
                SelectObject(self.memory, self.previous);
            }
            if !self.bitmap.is_invalid() {
                let _ = DeleteObject(HGDIOBJ(self.bitmap.0));
            }
            if !self.memory.is_invalid() {
                let _ = DeleteDC(self.memory);
            }
            if !self.screen.is_invalid() {
                ReleaseDC(HWND::default(), self.screen);
            }
        }
    }
}

impl ScreenGrabber for GdiScreenGrabber {
    fn grab(&self, region: CaptureRegion) -> Result<RawFrame, CaptureError> {
        let (width, height) = (region.width as i32, region.height as i32);
        if width <= 0 || height <= 0 {
            return Err(CaptureError::Platform(format!(
                "empty capture region {}x{}",
                region.width, region.height
            )));
        }

        let mut res = GdiResources {
            screen: HDC::default(),
            memory: HDC::default(),
            bitmap: HBITMAP::default(),
            previous: HGDIOBJ::default(),
        };

        // SAFETY: handles are checked before use and released by `res` on drop.
        unsafe {
            res.screen = GetDC(HWND::default());
            if res.screen.is_invalid() {
                return Err(CaptureError::Platform("GetDC failed".into()));
            }
            res.memory = CreateCompatibleDC(res.screen);
            if res.memory.is_invalid() {
                return Err(CaptureError::Platform("CreateCompatibleDC failed".into()));
            }
            res.bitmap = CreateCompatibleBitmap(res.screen, width, height);
            if res.bitmap.is_invalid() {
                return Err(CaptureError::Platform("CreateCompatibleBitmap failed".into()));
            }
            res.previous = SelectObject(res.memory, HGDIOBJ(res.bitmap.0));

            BitBlt(
                res.memory, 0, 0, width, height, res.screen, region.x, region.y, SRCCOPY,
            )
            .map_err(|e| CaptureError::Platform(format!("BitBlt: {e}")))?;
        }

        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: width,
                // Negative height asks for top-down rows.
                biHeight: -height,
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let stride = region.width as usize * 4;
        let mut data = vec![0u8; stride * region.height as usize];

        // SAFETY: `data` holds exactly `height` rows of 32-bit pixels and the
        // bitmap is no longer selected into a DC after the deselect below.
        let lines = unsafe {
            SelectObject(res.memory, res.previous);
            res.previous = HGDIOBJ::default();
            GetDIBits(
                res.memory,
                res.bitmap,
                0,
                region.height,
                Some(data.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if lines != height {
            return Err(CaptureError::Platform(format!(
                "GetDIBits copied {lines} of {height} lines"
            )));
        }

        Ok(RawFrame {
            width: region.width,
            height: region.height,
            stride,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_region_is_rejected_without_gdi_calls() {
        let grabber = GdiScreenGrabber::new();
        let region = CaptureRegion {
            x: 0,
            y: 0,
            width: 0,
            height: 10,
        };
        assert!(grabber.grab(region).is_err());
    }
}
