use std::sync::Arc;

use crate::models::config::AudioFormat;

/// Loss-free, session-lifetime sample store.
///
/// Append-only while the session is recording; frozen at stop and read
/// wholly by the exporter. Storage is pre-reserved at session start and
/// grows geometrically, so the capture path pays no per-push allocation in
/// steady state. The bounded display ring may drop frames under pressure —
/// this store never does.
#[derive(Debug)]
pub struct AccumulationStore {
    samples: Vec<f32>,
    frames: u64,
}

impl AccumulationStore {
    pub fn with_reserve(samples_hint: usize) -> Self {
        Self {
            samples: Vec::with_capacity(samples_hint),
            frames: 0,
        }
    }

    /// Append one accepted frame's samples.
    pub fn append(&mut self, samples: &[f32]) {
        self.samples.extend_from_slice(samples);
        self.frames += 1;
    }

    /// Frames accepted since the last reset.
    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Discard contents and re-reserve for a new session.
    pub fn reset(&mut self, samples_hint: usize) {
        self.samples = Vec::with_capacity(samples_hint);
        self.frames = 0;
    }

    /// Immutable copy of the accumulated audio for export.
    pub fn snapshot(&self, format: AudioFormat) -> RecordingSnapshot {
        RecordingSnapshot {
            format,
            frames: self.frames,
            samples: Arc::from(self.samples.as_slice()),
        }
    }
}

/// Frozen view of a completed recording, handed to the exporter.
///
/// Cloning shares the sample allocation, and the contents never change, so
/// repeated exports of the same snapshot see identical PCM.
#[derive(Debug, Clone)]
pub struct RecordingSnapshot {
    pub format: AudioFormat,
    /// Frames accepted over the session.
    pub frames: u64,
    /// Interleaved f32 samples in capture order.
    pub samples: Arc<[f32]>,
}

impl RecordingSnapshot {
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Recorded audio length in seconds.
    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() as f64 / self.format.channels as f64;
        frames / self.format.sample_rate as f64
    }
}
