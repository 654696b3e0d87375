//! Take-once cell shared between racing completion paths.

use std::{
    mem::MaybeUninit,
    sync::atomic::{
        Ordering::AcqRel,
        AtomicBool,
    },
};

/// Cell holding a value which exactly one caller can move out.
///
/// Used to hold a receiver that more than one path may try to complete. Exactly one `take` call
/// gets the value, all others (before or after) get `None`.
pub(crate) struct AtomicTake<T> {
    // while set, val holds a live value. flipping it to false is what grants ownership of val.
    is_some: AtomicBool,
    val: MaybeUninit<T>,
}

impl<T> AtomicTake<T> {
    /// Construct holding `val`.
    pub(crate) const fn some(val: T) -> Self {
        AtomicTake {
            is_some: AtomicBool::new(true),
            val: MaybeUninit::new(val),
        }
    }

    /// Move the value out, unless some other caller already has.
    pub(crate) fn take(&self) -> Option<T> {
        // AcqRel so that the winner observes everything written before the value was shared
        if self.is_some.swap(false, AcqRel) {
            Some(unsafe { self.val.as_ptr().read() })
        } else {
            None
        }
    }
}

impl<T> Drop for AtomicTake<T> {
    fn drop(&mut self) {
        // drop val unless it was moved out
        drop(self.take());
    }
}

// the value is only ever moved out, never shared by reference, so sharing the cell between
// threads only requires the value to be sendable.
unsafe impl<T: Send> Sync for AtomicTake<T> {}
