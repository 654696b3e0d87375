// stock schedulers.

#[cfg(feature = "tokio")]
mod runtime;

#[cfg(feature = "tokio")]
pub use self::runtime::{TokioScheduler, ScheduleSender, ScheduleOperation};

use crate::{
    protocol::Scheduler,
    just::{just, Just},
};
use std::convert::Infallible;


/// Scheduler whose context is whatever thread starts the operation
///
/// `schedule()` completes inline, so `via(InlineScheduler.schedule(), s)` behaves like `s`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    type Schedule = Just<(), Infallible>;

    fn schedule(&self) -> Just<(), Infallible> {
        just(())
    }
}
