//! Control loop error types.

use thiserror::Error;

/// Result type alias for control loop operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that end the control loop.
///
/// Sampling failures are not listed: the loop logs them and skips the tick.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("core control failed: {0}")]
    Hotplug(#[from] cpustake_hotplug::HotplugError),
}
