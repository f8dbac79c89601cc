//! Error types for the scheduler control surface

use thiserror::Error;

/// Errors returned by scheduler control operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler has been disposed; it can never fire again
    #[error("scheduler has been disposed")]
    Disposed,

    /// The tick interval must be greater than zero
    #[error("tick interval must be greater than zero")]
    ZeroInterval,
}
