use crate::models::error::RecorderError;
use crate::models::state::SessionState;

/// Event hooks for session notifications.
///
/// Called from whichever thread drives the transition. Implementations
/// should marshal to the UI thread if needed.
pub trait SessionDelegate: Send + Sync {
    /// Called after each state transition.
    fn on_state_changed(&self, state: SessionState);

    /// Called when a device or storage failure is surfaced.
    fn on_error(&self, error: &RecorderError);
}
