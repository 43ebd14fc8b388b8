//! Playback session: wires probe, decoder, producer thread, scheduler,
//! audio sidecar, and terminal guard together, and tears it all down in
//! the right order however playback ends.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::audio::AudioSidecar;
use crate::channel::{FrameChannel, FrameMessage, HIRES_CAPACITY, STANDARD_CAPACITY};
use crate::decoding::VideoDecoder;
use crate::probe::{self, VideoMetadata};
use crate::producer::{run_producer, ProducerConfig};
use crate::render::FrameEncoder;
use crate::schedule::{self, run_schedule};
use crate::term::ScreenGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Truecolor half-block cells. Works in any truecolor terminal.
    Standard,
    /// Inline JPEG images over OSC 1337 (iTerm2 and compatibles).
    HiRes,
}

pub struct PlaybackSession {
    input: PathBuf,
    mode: RenderMode,
    native: bool,
    metadata: VideoMetadata,
    frame_interval: Duration,
}

impl PlaybackSession {
    /// Validate the input and probe its metadata. The presentation rate
    /// is fixed here for the whole session.
    pub fn open(input: &Path, mode: RenderMode, native: bool) -> Result<Self> {
        if !input.is_file() {
            return Err(anyhow!("no such video file: {}", input.display()));
        }
        let metadata = probe::probe_metadata(input)?;
        let fps = schedule::effective_fps(metadata.fps, mode == RenderMode::HiRes);
        Ok(Self {
            input: input.to_path_buf(),
            mode,
            native,
            metadata,
            frame_interval: schedule::frame_interval(fps),
        })
    }

    /// Run playback to completion (or interrupt). Blocks the calling
    /// thread; the decoder feeds the channel from a producer thread
    /// while this thread paces and renders.
    pub fn run(&self) -> Result<()> {
        let hires = self.mode == RenderMode::HiRes;
        let decoder = VideoDecoder::spawn(&self.input, self.metadata.width, self.metadata.height)?;

        let channel = FrameChannel::with_capacity(if hires {
            HIRES_CAPACITY
        } else {
            STANDARD_CAPACITY
        });
        let stop = Arc::new(AtomicBool::new(false));

        ctrlc::set_handler({
            let stop = Arc::clone(&stop);
            move || stop.store(true, Ordering::Relaxed)
        })
        .context("failed to install interrupt handler")?;

        let producer = thread::Builder::new()
            .name("frame-producer".into())
            .spawn({
                let channel = channel.clone();
                let stop = Arc::clone(&stop);
                let config = ProducerConfig {
                    hires,
                    native: self.native,
                };
                move || {
                    let mut decoder = decoder;
                    run_producer(&mut decoder, &channel, config, &stop);
                    decoder.finish();
                }
            })
            .context("failed to spawn producer thread")?;

        let encoder = match self.mode {
            RenderMode::Standard => FrameEncoder::HalfBlocks,
            RenderMode::HiRes => FrameEncoder::InlineImage,
        };

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut guard = ScreenGuard::enter(&mut out, hires)?;

        // Audio starts just before the scheduler anchors its clock so
        // both share (approximately) the same origin.
        let mut audio = AudioSidecar::spawn(&self.input);
        let result = run_schedule(
            &channel,
            encoder,
            self.frame_interval,
            hires,
            &stop,
            &mut out,
        );

        // Teardown runs in full on every exit path. An early consumer
        // exit can leave the producer blocked publishing the sentinel,
        // so drain the channel up to it before joining.
        stop.store(true, Ordering::Relaxed);
        audio.terminate();
        let reached_end = matches!(
            result,
            Ok(schedule::ScheduleOutcome {
                reached_end: true,
                ..
            })
        );
        if !reached_end {
            loop {
                match channel.get() {
                    FrameMessage::Frame(_) => continue,
                    FrameMessage::End => break,
                }
            }
        }
        let join = producer.join();
        let _ = guard.restore(&mut out);
        drop(out);

        let outcome = result?;
        if join.is_err() {
            return Err(anyhow!("producer thread panicked"));
        }
        eprintln!(
            "[telecine] played {} frames of {}",
            outcome.frames_rendered,
            self.input.display()
        );
        Ok(())
    }
}
