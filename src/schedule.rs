//! Presentation-time scheduling: the consumer side of the pipeline.
//!
//! Each dequeued frame gets a deadline `start_time + n * frame_interval`.
//! On schedule we sleep up to the deadline and render; behind schedule
//! we either fast-forward (discard the frame, high-resolution mode only)
//! or forgive the lag by re-anchoring the schedule origin at `now` and
//! rendering immediately. The clamp bounds drift to one decision cycle
//! instead of letting it compound.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::channel::{FrameChannel, FrameMessage};
use crate::render::FrameEncoder;
use crate::term::CURSOR_HOME;

/// Consecutive missed deadlines tolerated before fast-forwarding.
pub const HIRES_SKIP_THRESHOLD: u32 = 1;
pub const STANDARD_SKIP_THRESHOLD: u32 = 2;

/// High-resolution rendering is paced at most this fast; per-frame
/// encode cost makes the source's native rate unsustainable.
pub const HIRES_FPS_CAP: f64 = 24.0;

pub fn effective_fps(source_fps: f64, hires: bool) -> f64 {
    if hires {
        source_fps.min(HIRES_FPS_CAP)
    } else {
        source_fps
    }
}

pub fn frame_interval(fps: f64) -> Duration {
    Duration::from_secs_f64(1.0 / fps)
}

/// Decision for one dequeued frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Ahead of or on the deadline: sleep this long, then render.
    Sleep(Duration),
    /// Behind the deadline: render immediately, schedule re-anchored.
    RenderNow,
    /// Too far behind and more frames are queued: discard this frame.
    Skip,
}

/// Per-iteration scheduler state. Owned solely by the consumer task.
pub struct ScheduleState {
    frame_interval: Duration,
    skip_threshold: u32,
    allow_skip: bool,
    start_time: Instant,
    frame_count: u32,
    frames_behind: u32,
}

impl ScheduleState {
    /// `start_time` is the wall-clock origin, captured once at render
    /// loop entry. The fast-forward branch is enabled in
    /// high-resolution mode only; standard mode only ever clamps.
    pub fn new(frame_interval: Duration, hires: bool, start_time: Instant) -> Self {
        Self {
            frame_interval,
            skip_threshold: if hires {
                HIRES_SKIP_THRESHOLD
            } else {
                STANDARD_SKIP_THRESHOLD
            },
            allow_skip: hires,
            start_time,
            frame_count: 0,
            frames_behind: 0,
        }
    }

    /// Deadline for the most recently planned frame.
    pub fn target_time(&self) -> Instant {
        self.start_time + self.frame_interval * self.frame_count
    }

    /// Plan the next dequeued frame. `queued` is the channel occupancy
    /// at decision time; a skip is only worthwhile when another frame
    /// is already waiting.
    pub fn plan(&mut self, now: Instant, queued: usize) -> Step {
        self.frame_count += 1;
        let target = self.target_time();

        if now <= target {
            self.frames_behind = 0;
            return Step::Sleep(target - now);
        }

        self.frames_behind += 1;
        if self.allow_skip && self.frames_behind > self.skip_threshold && queued > 0 {
            return Step::Skip;
        }

        // Clamp: forgive the lag rather than compounding it. Future
        // deadlines count from `now`.
        self.start_time = now
            .checked_sub(self.frame_interval * self.frame_count)
            .unwrap_or(self.start_time);
        Step::RenderNow
    }
}

/// What the render loop observed, for teardown decisions.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleOutcome {
    pub frames_rendered: u32,
    /// True when the loop terminated on the channel sentinel (rather
    /// than the stop flag).
    pub reached_end: bool,
}

/// The consumer loop: dequeue, pace, encode, write. Blocks only inside
/// `FrameChannel::get` and the schedule sleep. Returns once the
/// sentinel is observed or the stop flag is set.
pub fn run_schedule(
    channel: &FrameChannel,
    encoder: FrameEncoder,
    frame_interval: Duration,
    hires: bool,
    stop: &AtomicBool,
    out: &mut impl Write,
) -> Result<ScheduleOutcome> {
    let mut state = ScheduleState::new(frame_interval, hires, Instant::now());
    let mut frames_rendered = 0;

    loop {
        if stop.load(Ordering::Relaxed) {
            return Ok(ScheduleOutcome {
                frames_rendered,
                reached_end: false,
            });
        }

        let frame = match channel.get() {
            FrameMessage::Frame(frame) => frame,
            FrameMessage::End => {
                return Ok(ScheduleOutcome {
                    frames_rendered,
                    reached_end: true,
                });
            }
        };

        match state.plan(Instant::now(), channel.occupancy()) {
            Step::Skip => continue,
            Step::Sleep(wait) => thread::sleep(wait),
            Step::RenderNow => {}
        }

        let payload = encoder.encode(&frame)?;
        write!(out, "{CURSOR_HOME}{payload}").context("failed to write frame to terminal")?;
        out.flush().context("failed to flush terminal")?;
        frames_rendered += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn deadlines_advance_by_exactly_one_interval() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, false, start);

        let mut previous = start;
        for n in 1..=5u32 {
            let step = state.plan(start, 0);
            assert_eq!(step, Step::Sleep(INTERVAL * n));
            let target = state.target_time();
            assert_eq!(target - previous, INTERVAL, "deadline delta must be exact");
            previous = target;
        }
    }

    #[test]
    fn on_schedule_resets_behind_counter_and_sleeps_nonnegative() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, true, start);

        // Miss one deadline, then get back on schedule.
        assert_eq!(state.plan(start + INTERVAL * 3, 0), Step::RenderNow);
        match state.plan(start + INTERVAL * 3, 0) {
            // Clamped origin: second frame is due one interval later.
            Step::Sleep(wait) => assert_eq!(wait, INTERVAL),
            other => panic!("expected Sleep, got {other:?}"),
        }
        assert_eq!(state.frames_behind, 0);
    }

    #[test]
    fn behind_schedule_clamps_origin_to_now() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, false, start);

        let late = start + INTERVAL * 7;
        assert_eq!(state.plan(late, 0), Step::RenderNow);
        assert_eq!(state.target_time(), late, "clamp must re-anchor at now");
    }

    #[test]
    fn hires_skips_after_threshold_when_frames_are_queued() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, true, start);

        // First miss: within threshold, clamp and render.
        let now = start + INTERVAL * 2;
        assert_eq!(state.plan(now, 5), Step::RenderNow);
        // Second consecutive miss: past threshold, queued frames exist.
        let now = now + INTERVAL * 2;
        assert_eq!(state.plan(now, 5), Step::Skip);
    }

    #[test]
    fn hires_never_skips_an_empty_channel() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, true, start);

        let mut now = start;
        for _ in 0..4 {
            now += INTERVAL * 3;
            assert_eq!(state.plan(now, 0), Step::RenderNow);
        }
    }

    #[test]
    fn standard_mode_only_clamps() {
        let start = Instant::now();
        let mut state = ScheduleState::new(INTERVAL, false, start);

        let mut now = start;
        for _ in 0..6 {
            now += INTERVAL * 4;
            assert_eq!(state.plan(now, 9), Step::RenderNow);
        }
    }

    #[test]
    fn hires_fps_is_capped_at_24() {
        assert_eq!(effective_fps(60.0, true), 24.0);
        assert_eq!(effective_fps(23.976, true), 23.976);
        assert_eq!(effective_fps(60.0, false), 60.0);
    }

    #[test]
    fn frame_interval_inverts_fps() {
        assert_eq!(frame_interval(10.0), Duration::from_millis(100));
        assert_eq!(frame_interval(25.0), Duration::from_millis(40));
    }
}
