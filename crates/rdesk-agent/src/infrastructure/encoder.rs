//! JPEG frame encoder built on the `image` crate.
//!
//! Raw frames arrive as BGRA with a row stride; the alpha channel is dropped
//! and rows are repacked into tight RGB before compression.

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::application::stream_screen::{EncodeError, FrameEncoder, RawFrame};

/// [`FrameEncoder`] producing baseline JPEG.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFrameEncoder;

impl JpegFrameEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>, EncodeError> {
        let rgb = bgra_to_rgb(frame)?;
        let mut out = Vec::with_capacity(rgb.len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode(&rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
            .map_err(|e| EncodeError::Encoder(e.to_string()))?;
        Ok(out)
    }
}

fn bgra_to_rgb(frame: &RawFrame) -> Result<Vec<u8>, EncodeError> {
    if frame.width == 0 || frame.height == 0 {
        return Err(EncodeError::InvalidFrame(format!(
            "empty frame {}x{}",
            frame.width, frame.height
        )));
    }
    let row_bytes = frame.width as usize * 4;
    if frame.stride < row_bytes {
        return Err(EncodeError::InvalidFrame(format!(
            "stride {} shorter than row of {row_bytes} bytes",
            frame.stride
        )));
    }
    let needed = frame.stride * (frame.height as usize - 1) + row_bytes;
    if frame.data.len() < needed {
        return Err(EncodeError::InvalidFrame(format!(
            "buffer holds {} bytes, need {needed}",
            frame.data.len()
        )));
    }

    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for row in frame.data.chunks(frame.stride).take(frame.height as usize) {
        for px in row[..row_bytes].chunks_exact(4) {
            rgb.extend_from_slice(&[px[2], px[1], px[0]]);
        }
    }
    Ok(rgb)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
