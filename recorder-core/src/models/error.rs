use thiserror::Error;

use super::state::SessionState;

/// Errors that can occur during recording and export.
///
/// Nothing here is fatal to the process: every failure is returned to the
/// caller, which decides whether to retry or abort. Display-ring overflow is
/// deliberately not an error — it is a counted, policy-defined drop surfaced
/// through `SessionDiagnostics`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RecorderError {
    #[error("cannot {op} while {from}")]
    InvalidTransition {
        op: &'static str,
        from: SessionState,
    },

    #[error("device error: {0}")]
    DeviceError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("nothing to export")]
    NothingToExport,

    #[error("export I/O failed: {0}")]
    ExportIo(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),
}
