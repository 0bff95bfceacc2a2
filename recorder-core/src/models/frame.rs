use std::sync::Arc;
use std::time::Instant;

/// One captured chunk of interleaved f32 samples in `[-1.0, 1.0]`.
///
/// Immutable once produced: the capture callback copies the device buffer
/// into an `Arc` slice, and every downstream reader (meter, waveform feed,
/// ring cursors) shares that allocation.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    /// Monotonically increasing capture index, assigned by the session.
    pub seq: u64,

    /// When the device callback delivered this chunk.
    pub captured_at: Instant,

    /// True for frames delivered while the session was paused. Muted frames
    /// reach the display ring so the UI can show the live signal, but are
    /// never accumulated into the recording.
    pub muted: bool,

    pub samples: Arc<[f32]>,
}

impl AudioFrame {
    pub fn new(seq: u64, muted: bool, samples: &[f32]) -> Self {
        Self {
            seq,
            captured_at: Instant::now(),
            muted,
            samples: Arc::from(samples),
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Windowed amplitude reading, normalized to `[0.0, 1.0]` full scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LevelReading {
    pub rms: f32,
    pub peak: f32,
}
