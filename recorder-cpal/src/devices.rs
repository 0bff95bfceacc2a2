use cpal::traits::{DeviceTrait, HostTrait};

use recorder_core::DeviceInfo;

/// List available input devices on the default host.
///
/// Enumeration failures are logged and yield an empty list; a UI shell can
/// still offer the default device.
pub fn list_input_devices() -> Vec<DeviceInfo> {
    let host = cpal::default_host();
    let default_name = host
        .default_input_device()
        .and_then(|d| d.name().ok());

    let devices = match host.input_devices() {
        Ok(devices) => devices,
        Err(err) => {
            log::warn!("failed to enumerate input devices: {err}");
            return Vec::new();
        }
    };

    devices
        .filter_map(|device| device.name().ok())
        .map(|name| DeviceInfo {
            id: name.clone(),
            is_default: default_name.as_deref() == Some(name.as_str()),
            name,
        })
        .collect()
}
