//! telecine: play video files inside a terminal.
//!
//! Frames are decoded by an ffmpeg child process and pushed through a
//! bounded channel to a presentation-time scheduler, which paces them
//! against a wall-clock deadline and writes them out as either
//! truecolor half-block cells or OSC 1337 inline images. An ffplay
//! sidecar carries the audio track.

pub mod audio;
pub mod channel;
pub mod decoding;
pub mod frame;
pub mod probe;
pub mod producer;
pub mod render;
pub mod schedule;
pub mod session;
pub mod term;

pub use frame::Frame;
pub use session::{PlaybackSession, RenderMode};
