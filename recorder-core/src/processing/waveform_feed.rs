use std::collections::VecDeque;

use crate::processing::ring_buffer::{FrameRing, RingCursor};

/// Downsampled amplitude feed for waveform display.
///
/// Each block of `block_samples` raw samples is reduced to the block's peak
/// absolute value, so short transients stay visible at plot resolution. The
/// resulting points form a sliding window of at most `window_points`
/// entries; the oldest point is evicted once the window is full. A partial
/// trailing block is carried over to the next poll, so block boundaries are
/// independent of frame boundaries.
#[derive(Debug)]
pub struct WaveformFeed {
    cursor: RingCursor,
    block_samples: usize,
    window_points: usize,
    /// Absolute values of the in-progress block.
    pending: Vec<f32>,
    points: VecDeque<f32>,
}

impl WaveformFeed {
    pub fn new(block_samples: usize, window_points: usize) -> Self {
        assert!(block_samples > 0, "block size must be positive");
        assert!(window_points > 0, "window capacity must be positive");
        Self {
            cursor: RingCursor::START,
            block_samples,
            window_points,
            pending: Vec::with_capacity(block_samples),
            points: VecDeque::with_capacity(window_points),
        }
    }

    /// Feed sized for a display window of `window_secs` seconds at
    /// `sample_rate`, with one point per `block_samples` raw samples.
    pub fn for_display(sample_rate: u32, window_secs: u32, block_samples: usize) -> Self {
        let window_points =
            ((sample_rate as usize * window_secs as usize) / block_samples).max(1);
        Self::new(block_samples, window_points)
    }

    /// Consume frames newer than the cursor, fold them into display
    /// points, and return the current window (oldest first).
    pub fn poll(&mut self, ring: &FrameRing) -> Vec<f32> {
        let (frames, next) = ring.read_since(self.cursor);
        self.cursor = next;

        for frame in &frames {
            for &s in frame.samples.iter() {
                self.pending.push(s.abs());
                if self.pending.len() == self.block_samples {
                    let peak = self.pending.iter().copied().fold(0.0f32, f32::max);
                    self.push_point(peak);
                    self.pending.clear();
                }
            }
        }

        self.snapshot()
    }

    /// Current window contents without consuming frames.
    pub fn snapshot(&self) -> Vec<f32> {
        self.points.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window_points
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.points.clear();
    }

    fn push_point(&mut self, point: f32) {
        if self.points.len() == self.window_points {
            self.points.pop_front();
        }
        self.points.push_back(point);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::models::frame::AudioFrame;

    #[test]
    fn peak_of_block_downsampling() {
        let mut ring = FrameRing::new(8);
        let mut feed = WaveformFeed::new(4, 16);

        ring.push(AudioFrame::new(0, false, &[0.1, -0.9, 0.2, 0.3, 0.5, 0.4, -0.6, 0.1]));

        let points = feed.poll(&ring);
        assert_eq!(points.len(), 2);
        assert_relative_eq!(points[0], 0.9, epsilon = 1e-6);
        assert_relative_eq!(points[1], 0.6, epsilon = 1e-6);
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut ring = FrameRing::new(64);
        let mut feed = WaveformFeed::new(2, 3);

        for seq in 0..20 {
            ring.push(AudioFrame::new(seq, false, &[seq as f32 / 100.0, 0.0]));
        }

        let points = feed.poll(&ring);
        assert_eq!(points.len(), 3);
        // Sliding window: only the newest points survive.
        assert_relative_eq!(points[2], 0.19, epsilon = 1e-6);
    }

    #[test]
    fn partial_blocks_carry_over_between_polls() {
        let mut ring = FrameRing::new(8);
        let mut feed = WaveformFeed::new(4, 16);

        ring.push(AudioFrame::new(0, false, &[0.1, 0.2, 0.3]));
        let points = feed.poll(&ring);
        assert!(points.is_empty());

        ring.push(AudioFrame::new(1, false, &[0.8, 0.0]));
        let points = feed.poll(&ring);
        assert_eq!(points.len(), 1);
        assert_relative_eq!(points[0], 0.8, epsilon = 1e-6);
    }

    #[test]
    fn poll_without_new_frames_keeps_window() {
        let mut ring = FrameRing::new(8);
        let mut feed = WaveformFeed::new(2, 8);

        ring.push(AudioFrame::new(0, false, &[0.5, 0.5]));
        let first = feed.poll(&ring);
        assert_eq!(first.len(), 1);

        let second = feed.poll(&ring);
        assert_eq!(second, first);
    }

    #[test]
    fn display_sizing() {
        // 3-second window at 44.1 kHz with 1024-sample blocks.
        let feed = WaveformFeed::for_display(44_100, 3, 1024);
        assert_eq!(feed.capacity(), 129);
    }

    #[test]
    fn clear_resets_window_and_pending() {
        let mut ring = FrameRing::new(8);
        let mut feed = WaveformFeed::new(2, 8);

        ring.push(AudioFrame::new(0, false, &[0.5, 0.5, 0.5]));
        feed.poll(&ring);
        feed.clear();

        assert!(feed.is_empty());
        assert!(feed.snapshot().is_empty());
    }
}
