// interfaces consumed and produced by the core but implemented by collaborators.

use super::Sender;


/// Handle to an execution context
pub trait Scheduler {
    /// Sender that completes with `()` once running on this scheduler's context
    type Schedule: Sender<Value = ()>;

    /// Make a sender that transfers execution onto this scheduler's context.
    fn schedule(&self) -> Self::Schedule;
}

/// Asynchronous sequence of elements, each pulled with a sender
pub trait Stream {
    /// Sender for the next element. Completes with done once the stream is exhausted.
    type Next: Sender;
    /// Sender that finalizes the stream
    type Cleanup: Sender<Value = ()>;

    /// Make a sender for the next element.
    fn next(&mut self) -> Self::Next;

    /// Make a sender that cleans up the stream.
    fn cleanup(&mut self) -> Self::Cleanup;
}
