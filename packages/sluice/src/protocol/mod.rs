// the completion protocol.
//
// the moving parts fit together like this:
//
//   Sender ---connect(Receiver)---> OperationState ---start()---> ... ---> exactly one of
//                                                                          set_value
//                                                                          set_error
//                                                                          set_done
//
// - a Sender is an inert description of work. it declares its value and error payload types as
//   associated types and is consumed by connect.
// - a Receiver is the single consumer of the outcome. its completion methods take self by value,
//   so a second completion through the same receiver cannot be written. where two paths may race
//   to complete (organic completion vs. a stop callback), the receiver lives in an AtomicTake and
//   whichever path takes it first delivers.
// - an OperationState owns the receiver (or the cell it lives in) from connect until completion.
//   start must be called exactly once.
//
// the stop token half of the protocol lives in the stop module, because it is also used by
// things that are not senders.

mod sender;
mod blocking;
mod stream;

pub use self::{
    sender::{Sender, Receiver, OperationState, Outcome},
    blocking::Blocking,
    stream::{Stream, Scheduler},
};
