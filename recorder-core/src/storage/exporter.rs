use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::config::AudioFormat;
use crate::models::error::RecorderError;
use crate::processing::pcm;
use crate::session::store::RecordingSnapshot;
use crate::storage::encoder::{BitstreamEncoder, FlacBitstream};
use crate::storage::wav;

/// Samples handed to the bitstream encoder per `accept` call.
const ENCODE_CHUNK_SAMPLES: usize = 4096;

/// Target container for an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Wav,
    Flac,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Flac => "flac",
        }
    }
}

/// A finished export on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub audio: AudioFormat,
    /// PCM data bytes for WAV; total bitstream bytes for FLAC.
    pub payload_bytes: u64,
    /// SHA-256 hex digest of the file contents.
    pub checksum: String,
}

/// Write a frozen recording to `path` in the requested format.
///
/// The file is staged in a temporary sibling and renamed into place after
/// a successful flush, so the final path either holds a complete, valid
/// file or nothing at all. The snapshot is never mutated; exporting the
/// same snapshot twice produces byte-identical PCM payloads.
pub fn export(
    snapshot: &RecordingSnapshot,
    format: ExportFormat,
    path: &Path,
) -> Result<ExportArtifact, RecorderError> {
    if snapshot.is_empty() {
        return Err(RecorderError::NothingToExport);
    }

    let (bytes, payload_bytes) = match format {
        ExportFormat::Wav => {
            let data = pcm::to_i16_le_bytes(&snapshot.samples);
            let payload = data.len() as u64;
            (wav::file_image(snapshot.format, &data), payload)
        }
        ExportFormat::Flac => {
            let samples = pcm::to_i16(&snapshot.samples);
            let mut encoder = FlacBitstream::new(snapshot.format);
            for chunk in samples.chunks(ENCODE_CHUNK_SAMPLES) {
                encoder.accept(chunk)?;
            }
            let bytes = encoder.finish()?;
            let payload = bytes.len() as u64;
            (bytes, payload)
        }
    };

    write_atomic(path, &bytes)?;

    let checksum = sha256_hex(&bytes);
    log::info!(
        "exported {} bytes of {} to {}",
        bytes.len(),
        format.extension(),
        path.display()
    );

    Ok(ExportArtifact {
        path: path.to_path_buf(),
        format,
        audio: snapshot.format,
        payload_bytes,
        checksum,
    })
}

/// Stage `bytes` in a temporary file next to `path`, then rename into
/// place. On any failure the temporary is discarded and the final path is
/// left untouched.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), RecorderError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)
        .map_err(|err| RecorderError::ExportIo(format!("create output directory: {err}")))?;

    let mut staged = tempfile::NamedTempFile::new_in(dir)
        .map_err(|err| RecorderError::ExportIo(format!("create temporary file: {err}")))?;
    staged
        .write_all(bytes)
        .map_err(|err| RecorderError::ExportIo(format!("write: {err}")))?;
    staged
        .flush()
        .map_err(|err| RecorderError::ExportIo(format!("flush: {err}")))?;
    staged
        .persist(path)
        .map_err(|err| RecorderError::ExportIo(format!("rename into place: {}", err.error)))?;
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
