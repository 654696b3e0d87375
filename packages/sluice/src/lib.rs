//! Sender/receiver completion protocol with allocation-frugal combinators.
//!
//! A [`Sender`] describes an operation that will eventually deliver exactly one of a value, an
//! error, or a cancellation ("done") signal to a [`Receiver`]. Connecting the two produces an
//! [`OperationState`], which does nothing until it is started. Combinators such as [`via`] and
//! [`map`] build bigger senders out of smaller ones with static dispatch, so a pipeline is one
//! nested type rather than a chain of boxed callbacks.
//!
//! ```
//! use sluice::{just, map, sync_wait, via, InlineScheduler, Scheduler};
//!
//! // via needs an error type that a failed submission can be converted into
//! let start = just::<i32, anyhow::Error>(20);
//! let pipeline = map(via(InlineScheduler.schedule(), start), |x: i32| x + 22);
//! assert_eq!(sync_wait(pipeline).unwrap(), Some(42));
//! ```

#[macro_use]
extern crate tracing;

mod protocol;
mod stop;
mod util;
mod just;
mod map;
mod never;
mod via;
mod then_execute;
mod via_stream;
mod scheduler;
mod sync_wait;
#[cfg(feature = "futures")]
mod awaitable;
#[cfg(test)]
mod testing;

pub mod error;

pub use crate::{
    protocol::*,
    stop::*,
    just::*,
    map::*,
    never::*,
    via::{via, ViaSender, ViaOperation},
    then_execute::then_execute,
    via_stream::{via_stream, ViaStream},
    scheduler::*,
    sync_wait::{sync_wait, sync_wait_with},
};

#[cfg(feature = "futures")]
pub use crate::awaitable::{awaitable_sender, from_future, AwaitableSender, Infallibly, SenderTask};
