//! Low-level utilities.

mod atomic_take;
mod abort_on_drop;

pub(crate) use self::{
    atomic_take::AtomicTake,
    abort_on_drop::fatal,
};
#[cfg(feature = "futures")]
pub(crate) use self::abort_on_drop::AbortOnDrop;
