//! Fatal protocol violations.

use std::process::abort;
#[cfg(feature = "futures")]
use std::mem::forget;


/// Abort the process after logging why.
///
/// For paths that can only be reached if a protocol invariant has already been broken, where no
/// safe continuation exists.
pub(crate) fn fatal(reason: &str) -> ! {
    error!(%reason, "protocol invariant violated, aborting");
    abort()
}

/// Guard that aborts the process if dropped without being disarmed.
///
/// Wrapped around calls that must not unwind, such as completing a receiver from a context that
/// cannot recover if the receiver panics.
#[cfg(feature = "futures")]
pub(crate) struct AbortOnDrop(&'static str);

#[cfg(feature = "futures")]
impl AbortOnDrop {
    /// Arm with the reason to log if it goes off.
    pub(crate) fn new(reason: &'static str) -> Self {
        AbortOnDrop(reason)
    }

    /// Defuse without aborting.
    pub(crate) fn disarm(self) {
        forget(self);
    }
}

#[cfg(feature = "futures")]
impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        fatal(self.0);
    }
}
