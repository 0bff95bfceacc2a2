use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use recorder_core::{AudioFormat, AudioInputCallback, DeviceInfo, DeviceProvider, RecorderError};

/// Default samples per chunk delivered to the session (~23 ms at 44.1 kHz).
const DEFAULT_CHUNK_SAMPLES: usize = 1024;

/// Microphone input via cpal.
///
/// Opens the default (or a named) input device at its native configuration
/// and normalizes in the capture callback: channel conversion to the
/// session layout, linear resampling to the session rate, then fixed-size
/// chunk delivery. The `Stream` is pinned to the thread that created it,
/// which is why `DeviceProvider` carries no `Send` bound.
pub struct CpalInput {
    device_name: Option<String>,
    chunk_samples: usize,
    stream: Option<Stream>,
}

impl CpalInput {
    /// Capture from the system default input device.
    pub fn default_device() -> Self {
        Self {
            device_name: None,
            chunk_samples: DEFAULT_CHUNK_SAMPLES,
            stream: None,
        }
    }

    /// Capture from a named input device.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
            chunk_samples: DEFAULT_CHUNK_SAMPLES,
            stream: None,
        }
    }

    pub fn with_chunk_samples(mut self, chunk_samples: usize) -> Self {
        self.chunk_samples = chunk_samples.max(1);
        self
    }

    fn resolve(&self) -> Result<cpal::Device, RecorderError> {
        let host = cpal::default_host();
        match &self.device_name {
            Some(name) => host
                .input_devices()
                .map_err(|err| {
                    RecorderError::DeviceError(format!("enumerate input devices: {err}"))
                })?
                .find(|d| d.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| RecorderError::DeviceError(format!("input device not found: {name}"))),
            None => host
                .default_input_device()
                .ok_or_else(|| RecorderError::DeviceError("no default input device".into())),
        }
    }
}

impl DeviceProvider for CpalInput {
    fn is_available(&self) -> bool {
        self.resolve().is_ok()
    }

    fn device_info(&self) -> DeviceInfo {
        let name = self
            .resolve()
            .ok()
            .and_then(|d| d.name().ok())
            .unwrap_or_else(|| "unavailable".into());
        DeviceInfo {
            id: name.clone(),
            name,
            is_default: self.device_name.is_none(),
        }
    }

    fn start(
        &mut self,
        format: AudioFormat,
        callback: AudioInputCallback,
    ) -> Result<(), RecorderError> {
        if self.stream.is_some() {
            return Err(RecorderError::DeviceError(
                "input stream already running".into(),
            ));
        }

        let device = self.resolve()?;
        let device_name = device.name().unwrap_or_else(|_| "unknown".into());
        let supported = device
            .default_input_config()
            .map_err(|err| RecorderError::DeviceError(format!("query input config: {err}")))?;

        let native_rate = supported.sample_rate().0;
        let native_channels = supported.channels();
        let sample_format = supported.sample_format();
        let stream_config: StreamConfig = supported.into();

        log::info!(
            "opening {device_name}: native {native_rate} Hz / {native_channels} ch ({sample_format:?}), \
             delivering {} Hz / {} ch",
            format.sample_rate,
            format.channels
        );

        let mut adapter = FormatAdapter::new(
            native_rate,
            native_channels as usize,
            format,
            self.chunk_samples,
            callback,
        );
        let err_fn = |err| log::error!("input stream error: {err}");

        let stream = match sample_format {
            SampleFormat::F32 => device.build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| adapter.feed(data),
                err_fn,
                None,
            ),
            SampleFormat::I16 => device.build_input_stream(
                &stream_config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> =
                        data.iter().map(|&s| f32::from(s) / 32_768.0).collect();
                    adapter.feed(&converted);
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => device.build_input_stream(
                &stream_config,
                move |data: &[u16], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<f32> = data
                        .iter()
                        .map(|&s| (f32::from(s) - 32_768.0) / 32_768.0)
                        .collect();
                    adapter.feed(&converted);
                },
                err_fn,
                None,
            ),
            other => {
                return Err(RecorderError::DeviceError(format!(
                    "unsupported sample format: {other:?}"
                )))
            }
        }
        .map_err(|err| RecorderError::DeviceError(format!("build input stream: {err}")))?;

        stream
            .play()
            .map_err(|err| RecorderError::DeviceError(format!("start input stream: {err}")))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn stop(&mut self) -> Result<(), RecorderError> {
        // Dropping the stream closes the device and joins the capture
        // callback, so no invocation can begin after this returns.
        if let Some(stream) = self.stream.take() {
            let _ = stream.pause();
            drop(stream);
        }
        Ok(())
    }
}

/// Converts native-format buffers to the session format and emits
/// fixed-size chunks.
struct FormatAdapter {
    native_rate: u32,
    native_channels: usize,
    target: AudioFormat,
    chunk_samples: usize,
    pending: Vec<f32>,
    callback: AudioInputCallback,
}

impl FormatAdapter {
    fn new(
        native_rate: u32,
        native_channels: usize,
        target: AudioFormat,
        chunk_samples: usize,
        callback: AudioInputCallback,
    ) -> Self {
        Self {
            native_rate,
            native_channels,
            target,
            chunk_samples,
            pending: Vec::with_capacity(chunk_samples * 2),
            callback,
        }
    }

    fn feed(&mut self, data: &[f32]) {
        let channels = self.target.channels as usize;
        let converted = convert_channels(data, self.native_channels, channels);
        let resampled = resample_linear(
            &converted,
            channels,
            self.native_rate,
            self.target.sample_rate,
        );

        self.pending.extend_from_slice(&resampled);
        while self.pending.len() >= self.chunk_samples {
            let chunk: Vec<f32> = self.pending.drain(..self.chunk_samples).collect();
            (self.callback)(&chunk);
        }
    }
}

/// Convert interleaved audio between channel layouts.
///
/// Mono targets average all native channels per frame; stereo targets take
/// the first two native channels (duplicating mono input).
fn convert_channels(samples: &[f32], native: usize, target: usize) -> Vec<f32> {
    if native == target || native == 0 {
        return samples.to_vec();
    }

    let frames = samples.len() / native;
    let mut out = Vec::with_capacity(frames * target);
    for frame in 0..frames {
        let base = frame * native;
        match target {
            1 => {
                let sum: f32 = samples[base..base + native].iter().sum();
                out.push(sum / native as f32);
            }
            _ => {
                out.push(samples[base]);
                out.push(samples[base + (native > 1) as usize]);
            }
        }
    }
    out
}

/// Linear interpolation resampling for interleaved audio.
fn resample_linear(input: &[f32], channels: usize, from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || input.is_empty() {
        return input.to_vec();
    }

    let frames = input.len() / channels;
    let ratio = to_rate as f64 / from_rate as f64;
    let out_frames = (frames as f64 * ratio) as usize;
    let mut out = vec![0.0f32; out_frames * channels];
    for i in 0..out_frames {
        let src = i as f64 / ratio;
        let idx = src as usize;
        let frac = (src - idx as f64) as f32;
        for ch in 0..channels {
            let s0 = input.get(idx * channels + ch).copied().unwrap_or(0.0);
            let s1 = input.get((idx + 1) * channels + ch).copied().unwrap_or(s0);
            out[i * channels + ch] = s0 + frac * (s1 - s0);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    fn collecting_callback() -> (AudioInputCallback, Arc<Mutex<Vec<Vec<f32>>>>) {
        let chunks: Arc<Mutex<Vec<Vec<f32>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&chunks);
        let callback: AudioInputCallback = Arc::new(move |samples: &[f32]| {
            sink.lock().push(samples.to_vec());
        });
        (callback, chunks)
    }

    #[test]
    fn stereo_to_mono_averages() {
        let mono = convert_channels(&[0.2, 0.4, -0.6, -0.2], 2, 1);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.3).abs() < 1e-6);
        assert!((mono[1] + 0.4).abs() < 1e-6);
    }

    #[test]
    fn mono_to_stereo_duplicates() {
        let stereo = convert_channels(&[0.5, -0.5], 1, 2);
        assert_eq!(stereo, vec![0.5, 0.5, -0.5, -0.5]);
    }

    #[test]
    fn matching_layout_passes_through() {
        let data = [0.1, 0.2, 0.3];
        assert_eq!(convert_channels(&data, 1, 1), data.to_vec());
    }

    #[test]
    fn resample_identity_when_rates_match() {
        let data = [0.1, 0.2, 0.3];
        assert_eq!(resample_linear(&data, 1, 44_100, 44_100), data.to_vec());
    }

    #[test]
    fn resample_halves_sample_count() {
        let input: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let out = resample_linear(&input, 1, 48_000, 24_000);
        assert_eq!(out.len(), 50);
        // Linear interpolation of a ramp stays on the ramp.
        assert!((out[10] - input[20]).abs() < 1e-5);
    }

    #[test]
    fn adapter_emits_fixed_size_chunks() {
        let (callback, chunks) = collecting_callback();
        let mut adapter = FormatAdapter::new(44_100, 1, AudioFormat::default(), 4, callback);

        adapter.feed(&[0.1, 0.2, 0.3]);
        assert!(chunks.lock().is_empty());

        adapter.feed(&[0.4, 0.5]);
        {
            let seen = chunks.lock();
            assert_eq!(seen.len(), 1);
            assert_eq!(seen[0], vec![0.1, 0.2, 0.3, 0.4]);
        }

        adapter.feed(&[0.6, 0.7, 0.8]);
        let seen = chunks.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[1], vec![0.5, 0.6, 0.7, 0.8]);
    }

    #[test]
    fn adapter_converts_layout_before_chunking() {
        let (callback, chunks) = collecting_callback();
        let mut adapter = FormatAdapter::new(44_100, 2, AudioFormat::default(), 2, callback);

        adapter.feed(&[0.2, 0.4, -0.2, -0.4]);
        let seen = chunks.lock();
        assert_eq!(seen.len(), 1);
        assert!((seen[0][0] - 0.3).abs() < 1e-6);
        assert!((seen[0][1] + 0.3).abs() < 1e-6);
    }
}
