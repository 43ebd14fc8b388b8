//! Bounded frame channel between the producer task and the scheduler.
//!
//! Capacity bounds memory; a full channel drops the incoming frame
//! rather than blocking the producer. The stream is terminated by a
//! single `End` sentinel which is inserted blocking, so it is delivered
//! even when the channel is momentarily full.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::frame::Frame;

/// Channel capacity in standard (half-block) mode.
pub const STANDARD_CAPACITY: usize = 10;
/// Channel capacity in high-resolution (inline image) mode. Larger
/// because that mode drops more aggressively upstream and needs to
/// absorb bigger timing excursions.
pub const HIRES_CAPACITY: usize = 30;

/// A channel slot: either a renderable frame or the end-of-stream
/// sentinel. The sentinel is inserted exactly once and never
/// reinserted.
#[derive(Debug)]
pub enum FrameMessage {
    Frame(Frame),
    End,
}

/// Fixed-capacity FIFO of ready-to-render frames. Cloned into the
/// producer thread; all synchronization is internal to the underlying
/// crossbeam channel, callers never take a lock.
#[derive(Clone)]
pub struct FrameChannel {
    tx: Sender<FrameMessage>,
    rx: Receiver<FrameMessage>,
}

impl FrameChannel {
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity);
        Self { tx, rx }
    }

    /// Non-blocking insert. Returns `false` (discarding the frame) when
    /// the channel is at capacity.
    pub fn try_put(&self, frame: Frame) -> bool {
        match self.tx.try_send(FrameMessage::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            // Consumer gone: the frame has nowhere to go either way.
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Blocking insert of the end-of-stream sentinel. Used only for the
    /// sentinel so it is never dropped.
    pub fn put_end(&self) {
        let _ = self.tx.send(FrameMessage::End);
    }

    /// Blocking removal. Returns the sentinel verbatim when reached.
    pub fn get(&self) -> FrameMessage {
        self.rx.recv().unwrap_or(FrameMessage::End)
    }

    /// Current number of queued messages.
    pub fn occupancy(&self) -> usize {
        self.rx.len()
    }
}
