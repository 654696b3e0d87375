// core traits of the completion protocol.

use super::Blocking;
use crate::stop::StopToken;


/// Single-use consumer of exactly one completion signal
///
/// `T` is the value payload and `E` the error payload. Each completion method consumes the
/// receiver, so at most one of them can ever be called.
///
/// Receivers must be `Send + 'static` because completion may happen on a different thread than
/// the one that started the operation, and operation states may keep them alive in shared cells.
pub trait Receiver<T, E>: Sized + Send + 'static {
    /// Stop token type handed out by [`stop_token`](Self::stop_token)
    type StopToken: StopToken;

    /// Deliver the value signal.
    fn set_value(self, value: T);

    /// Deliver the error signal.
    fn set_error(self, error: E);

    /// Deliver the done (cancellation) signal.
    fn set_done(self);

    /// Get a token through which the operation can observe cancellation requests aimed at this
    /// receiver.
    fn stop_token(&self) -> Self::StopToken;
}

/// Live state of one connected sender/receiver pair
pub trait OperationState: Send {
    /// Begin the operation.
    ///
    /// Must be called exactly once. The operation state must not be dropped before it has
    /// delivered its completion signal.
    fn start(&mut self);
}

/// Description of an asynchronous operation that has not been started
pub trait Sender: Sized {
    /// Value payload delivered on success
    type Value;
    /// Error payload delivered on failure
    type Error;
    /// Operation state produced by connecting to a receiver of type `R`
    type Operation<R>: OperationState
    where
        R: Receiver<Self::Value, Self::Error>;

    /// Whether starting this operation may block the caller, or complete inline.
    fn blocking(&self) -> Blocking {
        Blocking::Maybe
    }

    /// Connect to a receiver. Does not start any work.
    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<Self::Value, Self::Error>;
}

/// One of the three completion signals, as a value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Outcome<T, E> {
    /// The value signal
    Value(T),
    /// The error signal
    Error(E),
    /// The done (cancellation) signal
    Done,
}

impl<T, E> Outcome<T, E> {
    /// Deliver self to a receiver.
    pub fn deliver<R: Receiver<T, E>>(self, receiver: R) {
        match self {
            Outcome::Value(value) => receiver.set_value(value),
            Outcome::Error(error) => receiver.set_error(error),
            Outcome::Done => receiver.set_done(),
        }
    }

    /// Convert into the shape returned by blocking drivers: `None` means cancellation.
    pub fn into_result(self) -> Result<Option<T>, E> {
        match self {
            Outcome::Value(value) => Ok(Some(value)),
            Outcome::Error(error) => Err(error),
            Outcome::Done => Ok(None),
        }
    }
}
