use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::models::error::RecorderError;
use crate::storage::exporter::{ExportArtifact, ExportFormat};

/// Metadata sidecar describing an export artifact.
///
/// Written as `{artifact}.metadata.json` alongside the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub id: String,
    pub created_at: String,
    pub format: ExportFormat,
    pub sample_rate: u32,
    pub channels: u16,
    pub bit_depth: u16,
    pub frames: u64,
    pub payload_bytes: u64,
    pub checksum: String,
}

impl ArtifactMetadata {
    pub fn for_artifact(artifact: &ExportArtifact, frames: u64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
            format: artifact.format,
            sample_rate: artifact.audio.sample_rate,
            channels: artifact.audio.channels,
            bit_depth: artifact.audio.bit_depth,
            frames,
            payload_bytes: artifact.payload_bytes,
            checksum: artifact.checksum.clone(),
        }
    }
}

/// Write the metadata sidecar next to `artifact_path`.
pub fn write_metadata(
    metadata: &ArtifactMetadata,
    artifact_path: &Path,
) -> Result<(), RecorderError> {
    let sidecar = sidecar_path(artifact_path);
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|err| RecorderError::ExportIo(format!("serialize metadata: {err}")))?;
    fs::write(&sidecar, json)
        .map_err(|err| RecorderError::ExportIo(format!("write metadata: {err}")))?;
    Ok(())
}

/// Read the metadata sidecar for `artifact_path`.
pub fn read_metadata(artifact_path: &Path) -> Result<ArtifactMetadata, RecorderError> {
    let sidecar = sidecar_path(artifact_path);
    let json = fs::read_to_string(&sidecar)
        .map_err(|err| RecorderError::ExportIo(format!("read metadata: {err}")))?;
    serde_json::from_str(&json)
        .map_err(|err| RecorderError::ExportIo(format!("parse metadata: {err}")))
}

fn sidecar_path(artifact_path: &Path) -> PathBuf {
    let mut name = artifact_path.as_os_str().to_os_string();
    name.push(".metadata.json");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::models::config::AudioFormat;

    fn artifact() -> ExportArtifact {
        ExportArtifact {
            path: PathBuf::from("take.wav"),
            format: ExportFormat::Wav,
            audio: AudioFormat::default(),
            payload_bytes: 48,
            checksum: "abc123".into(),
        }
    }

    #[test]
    fn sidecar_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let artifact_path = dir.path().join("take.wav");

        let metadata = ArtifactMetadata::for_artifact(&artifact(), 6);
        write_metadata(&metadata, &artifact_path).unwrap();

        let loaded = read_metadata(&artifact_path).unwrap();
        assert_eq!(loaded, metadata);
        assert_eq!(loaded.frames, 6);
        assert_eq!(loaded.sample_rate, 44_100);
    }

    #[test]
    fn sidecar_name_appends_to_extension() {
        let path = sidecar_path(Path::new("out/take.flac"));
        assert_eq!(path, Path::new("out/take.flac.metadata.json"));
    }

    #[test]
    fn missing_sidecar_is_an_export_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_metadata(&dir.path().join("absent.wav")).unwrap_err();
        assert!(matches!(err, RecorderError::ExportIo(_)));
    }
}
