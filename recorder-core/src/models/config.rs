use serde::{Deserialize, Serialize};

/// PCM format of a session, negotiated at `start()` and fixed for the
/// session's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Number of interleaved channels (1 or 2).
    pub channels: u16,

    /// Bit depth of the PCM output. Only 16 is supported.
    pub bit_depth: u16,
}

impl AudioFormat {
    /// Bytes per frame (one sample per channel).
    pub fn block_align(&self) -> u16 {
        self.channels * self.bit_depth / 8
    }

    /// Bytes per second of audio.
    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            channels: 1,
            bit_depth: 16,
        }
    }
}

/// Configuration for a capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderConfig {
    /// Target PCM format.
    pub format: AudioFormat,

    /// Samples per frame chunk delivered by the device backend.
    pub chunk_samples: usize,

    /// Display ring capacity in frames. Sizing it for a few seconds of
    /// audio keeps meter and waveform readers well ahead of eviction.
    pub ring_frames: usize,

    /// Seconds of audio to pre-reserve in the accumulation store so the
    /// capture path does not allocate per push.
    pub prealloc_secs: u32,
}

impl RecorderConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.format.sample_rate == 0 {
            return Err("sample rate must be positive".into());
        }
        if ![1, 2].contains(&self.format.channels) {
            return Err(format!("unsupported channel count: {}", self.format.channels));
        }
        if self.format.bit_depth != 16 {
            return Err(format!("unsupported bit depth: {}", self.format.bit_depth));
        }
        if self.chunk_samples == 0 {
            return Err("chunk size must be positive".into());
        }
        if self.ring_frames == 0 {
            return Err("ring capacity must be positive".into());
        }
        Ok(())
    }
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            format: AudioFormat::default(),
            chunk_samples: 1024,
            // ~5 seconds of 1024-sample chunks at 44.1 kHz
            ring_frames: 256,
            prealloc_secs: 60,
        }
    }
}
