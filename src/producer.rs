//! The producer side of the pipeline: pull frames off the decoder,
//! transform them for the chosen encoder, and hand them to the channel.
//! Runs on its own thread; all pacing lives with the consumer.

use std::sync::atomic::{AtomicBool, Ordering};

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::channel::FrameChannel;
use crate::decoding::FrameSource;
use crate::frame::Frame;
use crate::render::fit_dimensions;
use crate::term;

/// High-resolution mode decodes every source frame but processes only
/// every Nth; the encoder cannot keep up with full-rate input.
pub const SOURCE_FRAME_STRIDE: u64 = 2;

/// High-resolution occupancy above which decoded frames are discarded
/// before the (expensive) transform, on top of the stride.
pub const BACKPRESSURE_HIGH_WATER: usize = 15;

#[derive(Debug, Clone, Copy)]
pub struct ProducerConfig {
    /// Inline-image pipeline: stride and backpressure apply, frames
    /// stay at native resolution.
    pub hires: bool,
    /// Half-block pipeline only: keep the source's native grid instead
    /// of fitting the terminal.
    pub native: bool,
}

/// Drain `source` into `channel`. Checks the stop flag before every
/// read and always ends by publishing the end-of-stream sentinel,
/// exactly once, whatever path exits the loop.
pub fn run_producer(
    source: &mut dyn FrameSource,
    channel: &FrameChannel,
    config: ProducerConfig,
    stop: &AtomicBool,
) {
    let mut source_index: u64 = 0;
    loop {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        let Some(frame) = source.next_frame() else {
            break;
        };
        let index = source_index;
        source_index += 1;

        if config.hires {
            if index % SOURCE_FRAME_STRIDE != 0 {
                continue;
            }
            if channel.occupancy() > BACKPRESSURE_HIGH_WATER {
                continue;
            }
            // Native resolution all the way to the encoder.
            let _ = channel.try_put(frame);
        } else {
            let ready = resize_to_block_grid(frame, config.native);
            // Channel full: drop the frame rather than block decode.
            let _ = channel.try_put(ready);
        }
    }
    channel.put_end();
}

/// Downscale (or upscale) a frame to the half-block pixel grid. With
/// `native` set the grid is the frame's own resolution and this is a
/// pass-through.
fn resize_to_block_grid(frame: Frame, native: bool) -> Frame {
    let (grid_w, grid_h) = if native {
        (frame.width(), frame.height())
    } else {
        term::block_pixel_grid()
    };
    let (w, h) = fit_dimensions(frame.width(), frame.height(), grid_w, grid_h);
    if (w, h) == (frame.width(), frame.height()) {
        return frame;
    }

    let (src_w, src_h) = (frame.width(), frame.height());
    let image = RgbImage::from_raw(src_w, src_h, frame.into_data())
        .expect("frame buffer length matches its dimensions");
    let resized = imageops::resize(&image, w, h, FilterType::Lanczos3);
    Frame::from_rgb(w, h, resized.into_raw())
}
