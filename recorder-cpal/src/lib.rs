//! # recorder-cpal
//!
//! cpal input backend for recorder-core.
//!
//! Provides:
//! - `CpalInput` — microphone capture implementing `DeviceProvider`
//! - `list_input_devices` — input device enumeration
//!
//! The backend captures at the device's native configuration and converts
//! to the session format before delivering buffers: channel conversion,
//! linear resampling, and fixed-size chunking all happen here so the core
//! only ever sees normalized frames.
//!
//! ## Usage
//! ```ignore
//! use recorder_core::{CaptureSession, RecorderConfig};
//! use recorder_cpal::CpalInput;
//!
//! let mut session = CaptureSession::new(CpalInput::default_device(), RecorderConfig::default())?;
//! session.start()?;
//! ```

pub mod devices;
pub mod input;

pub use devices::list_input_devices;
pub use input::CpalInput;
