use crate::models::config::AudioFormat;

/// Size of the canonical RIFF/WAVE header in bytes.
pub const WAV_HEADER_SIZE: usize = 44;

/// Build the canonical 44-byte RIFF header for a PCM payload of
/// `data_size` bytes.
///
/// Format code 1 (integer PCM), little-endian throughout:
/// ```text
/// [0-3]    "RIFF"
/// [4-7]    36 + data_size
/// [8-11]   "WAVE"
/// [12-15]  "fmt "
/// [16-19]  16 (PCM format chunk size)
/// [20-21]  1 (PCM format code)
/// [22-23]  channels
/// [24-27]  sample_rate
/// [28-31]  byte_rate
/// [32-33]  block_align
/// [34-35]  bit_depth
/// [36-39]  "data"
/// [40-43]  data_size
/// ```
/// The exporter always works from a frozen snapshot, so the final size is
/// known before the first byte is written and no placeholder patching is
/// ever needed.
pub fn header(format: AudioFormat, data_size: u32) -> [u8; WAV_HEADER_SIZE] {
    let chunk_size = 36 + data_size;
    let mut header = [0u8; WAV_HEADER_SIZE];

    header[0..4].copy_from_slice(b"RIFF");
    header[4..8].copy_from_slice(&chunk_size.to_le_bytes());
    header[8..12].copy_from_slice(b"WAVE");

    header[12..16].copy_from_slice(b"fmt ");
    header[16..20].copy_from_slice(&16u32.to_le_bytes());
    header[20..22].copy_from_slice(&1u16.to_le_bytes());
    header[22..24].copy_from_slice(&format.channels.to_le_bytes());
    header[24..28].copy_from_slice(&format.sample_rate.to_le_bytes());
    header[28..32].copy_from_slice(&format.byte_rate().to_le_bytes());
    header[32..34].copy_from_slice(&format.block_align().to_le_bytes());
    header[34..36].copy_from_slice(&format.bit_depth.to_le_bytes());

    header[36..40].copy_from_slice(b"data");
    header[40..44].copy_from_slice(&data_size.to_le_bytes());

    header
}

/// Assemble a complete WAV file image: header followed by the PCM payload.
pub fn file_image(format: AudioFormat, pcm: &[u8]) -> Vec<u8> {
    let mut image = Vec::with_capacity(WAV_HEADER_SIZE + pcm.len());
    image.extend_from_slice(&header(format, pcm.len() as u32));
    image.extend_from_slice(pcm);
    image
}
