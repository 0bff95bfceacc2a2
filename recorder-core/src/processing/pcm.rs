/// Convert normalized f32 samples to 16-bit PCM values.
///
/// Out-of-range input is clamped. Conversion is deterministic, so repeated
/// exports of the same snapshot produce identical payloads.
pub fn to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Convert normalized f32 samples to little-endian 16-bit PCM bytes.
///
/// Output length is `samples.len() * 2`.
pub fn to_i16_le_bytes(samples: &[f32]) -> Vec<u8> {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        data.extend_from_slice(&value.to_le_bytes());
    }
    data
}
