use crate::models::frame::LevelReading;
use crate::processing::ring_buffer::{FrameRing, RingCursor};

/// Pull-based RMS/peak meter with its own read cursor.
///
/// Polled on the UI cadence (50 ms is plenty), independent of device
/// callback timing. Muted frames are included so the meter keeps moving
/// while the session is paused. When no new frames have arrived the
/// previous reading is returned unchanged, so the meter does not flicker
/// to zero between polls.
#[derive(Debug)]
pub struct LevelMeter {
    cursor: RingCursor,
    last: LevelReading,
}

impl LevelMeter {
    /// Meter that reads everything the ring still retains.
    pub fn new() -> Self {
        Self {
            cursor: RingCursor::START,
            last: LevelReading::default(),
        }
    }

    /// Meter that only observes frames pushed after this call.
    pub fn attached(ring: &FrameRing) -> Self {
        Self {
            cursor: ring.cursor(),
            last: LevelReading::default(),
        }
    }

    /// Consume frames newer than the cursor and return peak and RMS over
    /// that slice, normalized to `[0.0, 1.0]` full scale.
    pub fn sample(&mut self, ring: &FrameRing) -> LevelReading {
        let (frames, next) = ring.read_since(self.cursor);
        self.cursor = next;

        let mut peak = 0.0f32;
        let mut sum_sq = 0.0f64;
        let mut count = 0usize;
        for frame in &frames {
            for &s in frame.samples.iter() {
                let abs = s.abs();
                if abs > peak {
                    peak = abs;
                }
                sum_sq += f64::from(s) * f64::from(s);
            }
            count += frame.samples.len();
        }

        if count == 0 {
            return self.last;
        }

        let rms = (sum_sq / count as f64).sqrt() as f32;
        self.last = LevelReading {
            rms: rms.min(1.0),
            peak: peak.min(1.0),
        };
        self.last
    }

    /// The most recent reading without consuming any frames.
    pub fn last(&self) -> LevelReading {
        self.last
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}
