use std::collections::VecDeque;

use crate::models::frame::AudioFrame;

/// Reader position into a `FrameRing`.
///
/// Positions are absolute push indices, so each reader advances
/// independently and a cursor stays meaningful after the ring evicts
/// frames the reader never saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RingCursor(u64);

impl RingCursor {
    /// A cursor that observes every frame still retained by the ring.
    pub const START: RingCursor = RingCursor(0);
}

/// Fixed-capacity frame ring decoupling the capture callback from display
/// readers.
///
/// Exactly one producer; any number of cursor-holding readers. Overflow
/// policy: drop-oldest — evictions are counted, never silent. `push` is
/// O(1) amortized and never waits on a reader. Wrap in
/// `Arc<parking_lot::Mutex<FrameRing>>` for cross-thread access.
#[derive(Debug)]
pub struct FrameRing {
    frames: VecDeque<AudioFrame>,
    capacity: usize,
    /// Push index of the next frame; grows monotonically for the life of
    /// the ring so cursors survive `clear`.
    head: u64,
    dropped: u64,
}

impl FrameRing {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be positive");
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
            head: 0,
            dropped: 0,
        }
    }

    /// Append a frame, evicting the oldest when full.
    pub fn push(&mut self, frame: AudioFrame) {
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
        }
        self.frames.push_back(frame);
        self.head += 1;
    }

    /// All retained frames at or after `cursor`, oldest first, together
    /// with the advanced cursor for the next read.
    ///
    /// A reader that fell behind eviction resumes at the oldest retained
    /// frame; the skipped frames show up in `dropped()`.
    pub fn read_since(&self, cursor: RingCursor) -> (Vec<AudioFrame>, RingCursor) {
        let tail = self.head - self.frames.len() as u64;
        let from = cursor.0.max(tail).min(self.head);
        let skip = (from - tail) as usize;
        let frames: Vec<AudioFrame> = self.frames.iter().skip(skip).cloned().collect();
        (frames, RingCursor(self.head))
    }

    /// A cursor positioned past everything currently in the ring.
    pub fn cursor(&self) -> RingCursor {
        RingCursor(self.head)
    }

    /// Total frames evicted by overflow since the last `clear`.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drop all retained frames and reset the overflow counter. `head`
    /// keeps growing, so stale cursors simply observe nothing until new
    /// frames arrive.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.dropped = 0;
    }
}
