use std::io::Read;
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};

use anyhow::{anyhow, Context, Result};

use crate::frame::Frame;

/// The pipeline's view of a decoder: frames in source order until
/// exhaustion. Implemented by `VideoDecoder` for real playback and by
/// synthetic sources in tests.
pub trait FrameSource {
    /// Next frame, or `None` once the source is exhausted.
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Long-running ffmpeg child decoding `input` to raw rgb24 frames on
/// stdout at the source's native resolution. Reads happen synchronously
/// on the producer thread; end of stream surfaces as EOF.
pub struct VideoDecoder {
    child: Child,
    stdout: ChildStdout,
    width: u32,
    height: u32,
    frame_size: usize,
}

impl VideoDecoder {
    pub fn spawn(input: &Path, width: u32, height: u32) -> Result<Self> {
        let mut child = Command::new("ffmpeg")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(input)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .stdin(Stdio::null())
            .spawn()
            .context("failed to spawn ffmpeg decoder")?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow!("failed to capture ffmpeg stdout"))?;

        Ok(Self {
            child,
            stdout,
            width,
            height,
            frame_size: (width * height * 3) as usize,
        })
    }

    /// Kill and reap the child. After EOF ffmpeg has already exited and
    /// the kill is a no-op.
    pub fn finish(mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl FrameSource for VideoDecoder {
    fn next_frame(&mut self) -> Option<Frame> {
        let mut buffer = vec![0u8; self.frame_size];
        match self.stdout.read_exact(&mut buffer) {
            Ok(()) => Some(Frame::from_rgb(self.width, self.height, buffer)),
            Err(_) => None,
        }
    }
}
