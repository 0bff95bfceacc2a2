//! # recorder-core
//!
//! Platform-agnostic voice recording core.
//!
//! Provides the capture session state machine, lossless accumulation,
//! display buffering/metering, and WAV/FLAC export. Device backends
//! (e.g. the cpal backend in `recorder-cpal`) implement the
//! `DeviceProvider` trait and plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! recorder-core (this crate)
//! ├── traits/       ← DeviceProvider, SessionDelegate
//! ├── models/       ← RecorderError, SessionState, RecorderConfig, AudioFrame, ...
//! ├── processing/   ← FrameRing, LevelMeter, WaveformFeed, PCM conversion
//! ├── session/      ← CaptureSession, AccumulationStore
//! └── storage/      ← Exporter, WAV header, FLAC bitstream, metadata sidecar
//! ```
//!
//! ## Data flow
//!
//! ```text
//! [DeviceProvider] → CaptureSession (state gate) ─┬→ AccumulationStore ──→ export (WAV / FLAC)
//!                                                 └→ FrameRing → {LevelMeter, WaveformFeed}
//! ```

pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::config::{AudioFormat, RecorderConfig};
pub use models::error::RecorderError;
pub use models::frame::{AudioFrame, LevelReading};
pub use models::state::SessionState;
pub use models::summary::{RecordingSummary, SessionDiagnostics};
pub use processing::level_meter::LevelMeter;
pub use processing::ring_buffer::{FrameRing, RingCursor};
pub use processing::waveform_feed::WaveformFeed;
pub use session::capture::CaptureSession;
pub use session::store::{AccumulationStore, RecordingSnapshot};
pub use storage::encoder::{BitstreamEncoder, FlacBitstream};
pub use storage::exporter::{export, ExportArtifact, ExportFormat};
pub use storage::metadata::{read_metadata, write_metadata, ArtifactMetadata};
pub use traits::device_provider::{AudioInputCallback, DeviceInfo, DeviceProvider};
pub use traits::session_delegate::SessionDelegate;
