use std::sync::Arc;

use crate::models::config::AudioFormat;
use crate::models::error::RecorderError;

/// Callback invoked when an input buffer is available.
///
/// Receives interleaved f32 samples already converted to the format passed
/// to `DeviceProvider::start`. Fires on a dedicated audio thread — the
/// implementation must stay bounded: no I/O, no unbounded allocation, no
/// waiting on locks held across slow work.
pub type AudioInputCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

/// A named input device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub id: String,
    pub name: String,
    pub is_default: bool,
}

/// Interface for audio input backends.
///
/// Implementations own the platform stream and deliver samples at the
/// negotiated format. Providers are not required to be `Send`: platform
/// streams are commonly pinned to their creating thread, and only the
/// callback crosses threads.
pub trait DeviceProvider {
    /// Whether an input device can currently be opened.
    fn is_available(&self) -> bool;

    /// Information about the device backing this provider.
    fn device_info(&self) -> DeviceInfo;

    /// Open the device and start delivering buffers via `callback`.
    ///
    /// May block briefly on driver I/O; never called from the capture
    /// callback context.
    fn start(
        &mut self,
        format: AudioFormat,
        callback: AudioInputCallback,
    ) -> Result<(), RecorderError>;

    /// Close the device. Must not return until the callback is quiesced —
    /// no invocation may begin after `stop` returns.
    fn stop(&mut self) -> Result<(), RecorderError>;
}
