//! The two frame encoders. Selected once at session start, never
//! switched mid-session.
//!
//! - Half-block: one `▀` cell per two vertically adjacent pixels,
//!   truecolor foreground/background. Coarse but universal.
//! - Inline image: JPEG + base64 wrapped in an OSC 1337 envelope for
//!   terminals that render inline images natively.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::frame::Frame;
use crate::term::{self, RESET};

/// Upper half block: foreground paints the upper pixel, background the
/// lower one.
const UPPER_HALF_BLOCK: char = '\u{2580}';

/// Larger frame dimension is capped to this before JPEG encode; encode
/// latency grows faster than visible detail past it.
pub const INLINE_MAX_DIM: u32 = 480;
/// Reduced quality, tuned for encode speed over fidelity.
pub const INLINE_JPEG_QUALITY: u8 = 50;
/// Cap on the cell-width hint in the image envelope.
pub const INLINE_MAX_WIDTH_CELLS: u16 = 100;

/// Encoder capability chosen at session construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEncoder {
    HalfBlocks,
    InlineImage,
}

impl FrameEncoder {
    /// Turn a frame into a terminal payload. Half-block encoding is
    /// infallible; the inline path propagates JPEG encode failures.
    pub fn encode(&self, frame: &Frame) -> Result<String> {
        match self {
            Self::HalfBlocks => Ok(encode_half_blocks(frame)),
            Self::InlineImage => {
                let (cols, _) = term::terminal_cells();
                encode_inline_image(frame, cols)
            }
        }
    }
}

/// Scale (width, height) preserving aspect ratio so it fits inside
/// (max_w, max_h). Scales in either direction; dimensions never drop
/// below 1.
pub fn fit_dimensions(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    debug_assert!(width > 0 && height > 0 && max_w > 0 && max_h > 0);
    let scale = f64::min(
        f64::from(max_w) / f64::from(width),
        f64::from(max_h) / f64::from(height),
    );
    let fitted_w = ((f64::from(width) * scale).round() as u32).clamp(1, max_w);
    let fitted_h = ((f64::from(height) * scale).round() as u32).clamp(1, max_h);
    (fitted_w, fitted_h)
}

/// Full-frame half-block encoding: newline-joined lines, each line
/// carrying one glyph per column and a trailing reset. An odd trailing
/// pixel row is padded with black (`Frame::pixel` reads black past the
/// bottom edge).
pub fn encode_half_blocks(frame: &Frame) -> String {
    let cell_rows = (frame.height() + 1) / 2;
    let mut lines = Vec::with_capacity(cell_rows as usize);
    for row in 0..cell_rows {
        // ~40 bytes per cell: two SGR sequences plus the glyph.
        let mut line = String::with_capacity(frame.width() as usize * 40 + RESET.len());
        for x in 0..frame.width() {
            let [ur, ug, ub] = frame.pixel(x, row * 2);
            let [lr, lg, lb] = frame.pixel(x, row * 2 + 1);
            line.push_str(&format!(
                "\x1b[38;2;{ur};{ug};{ub}m\x1b[48;2;{lr};{lg};{lb}m{UPPER_HALF_BLOCK}"
            ));
        }
        line.push_str(RESET);
        lines.push(line);
    }
    lines.join("\n")
}

/// Inline-image encoding: cap the larger dimension, JPEG at reduced
/// quality, base64, then the OSC 1337 envelope. The width hint is the
/// current terminal column count (capped); the terminal scales the
/// image at display time, preserving aspect ratio.
pub fn encode_inline_image(frame: &Frame, term_cols: u16) -> Result<String> {
    let image = RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .ok_or_else(|| anyhow!("frame buffer does not match its dimensions"))?;

    let resized = if frame.width().max(frame.height()) > INLINE_MAX_DIM {
        let (w, h) = fit_dimensions(frame.width(), frame.height(), INLINE_MAX_DIM, INLINE_MAX_DIM);
        imageops::resize(&image, w, h, FilterType::Triangle)
    } else {
        image
    };

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, INLINE_JPEG_QUALITY).encode_image(&resized)?;

    let width = term_cols.min(INLINE_MAX_WIDTH_CELLS);
    Ok(format!(
        "\x1b]1337;File=inline=1;width={width};preserveAspectRatio=1:{}\x07",
        BASE64.encode(&jpeg)
    ))
}
