//! Error types

use std::any::Any;
use thiserror::Error;


/// A panic caught at a protocol boundary and turned into an error signal
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("panicked: {message}")]
pub struct PanicError {
    message: String,
}

impl PanicError {
    /// Capture the message of a panic payload, as returned by `catch_unwind`.
    pub fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = payload.downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "<non-string panic payload>".to_owned());
        PanicError { message }
    }

    /// The panic message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Error for a successor operation which could not be connected or started
///
/// [`via`](crate::via) delivers this straight to its final receiver, bypassing the successor, so
/// that a failure to schedule is reported the same way as a failure to compute.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("failed to submit successor operation")]
pub struct SubmitError(#[from] PanicError);

impl SubmitError {
    /// The panic that interrupted submission.
    pub fn panic(&self) -> &PanicError {
        &self.0
    }
}

/// Error for a scheduled operation that could not be run on its target context
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ScheduleError {
    /// The runtime was shut down before the scheduled task got to run
    #[error("runtime shut down before the scheduled task ran")]
    RuntimeShutdown,
}
