// context-forwarding composition.
//
// via(successor, predecessor) runs the predecessor, holds on to its outcome, runs the successor,
// and only once the successor completes hands the held outcome to the final receiver. the
// successor is typically a scheduler's schedule() sender, so the final receiver runs on the
// successor's context.
//
// the pieces:
//
//   ViaOperation
//     |------ predecessor operation state, connected to a PredecessorReceiver
//     |
//     \------ successor slot: Arc<Mutex<Option<SuccessorOperation>>>. empty until the predecessor
//             completes. the PredecessorReceiver holds the other handle to it and fills it in.
//
//   PredecessorReceiver, on any of its three signals, connects the successor to one of three
//   adapters (ValueReceiver, ErrorReceiver, DoneReceiver), stores the resulting operation state in
//   the slot, and starts it.
//
//   each adapter carries the captured predecessor outcome plus a Downstream, which is the final
//   receiver in an AtomicTake. on successor value the adapter delivers the captured outcome. on
//   successor error or done, that overrides the captured outcome.
//
// the final receiver lives in an AtomicTake rather than directly in the adapter so that if
// connecting or starting the successor panics, the panic can still be reported to it as an error.
// a panic raised after the receiver was taken (by the receiver itself, or by a map function
// downstream of it) is resumed instead, so it reaches whoever started the operation.

use crate::{
    protocol::*,
    error::{PanicError, SubmitError},
    util::AtomicTake,
};
use std::{
    marker::PhantomData,
    panic::{catch_unwind, resume_unwind, AssertUnwindSafe},
    sync::{Arc, Mutex, PoisonError},
};


/// Sender that runs a predecessor, then a successor, then delivers the predecessor's outcome
///
/// See [`via`].
#[derive(Debug, Clone)]
pub struct ViaSender<P, S> {
    predecessor: P,
    successor: S,
}

/// Run `predecessor`, then `successor`, then deliver the predecessor's outcome.
///
/// Whatever the predecessor's outcome (value, error, or done), the successor is started after it,
/// and the outcome is delivered to the final receiver only once the successor has completed with a
/// value, in the successor's execution context. The successor's own value is discarded. If the
/// successor instead completes with an error or done, that is delivered in place of the
/// predecessor's outcome.
///
/// The successor's error type must convert into the predecessor's, and so must [`SubmitError`],
/// which is delivered if connecting or starting the successor panics.
pub fn via<S, P>(successor: S, predecessor: P) -> ViaSender<P, S> {
    ViaSender { predecessor, successor }
}

impl<P, S> Sender for ViaSender<P, S>
where
    P: Sender,
    S: Sender + Send + 'static,
    P::Value: Send + 'static,
    P::Error: From<S::Error> + From<SubmitError> + Send + 'static,
{
    type Value = P::Value;
    type Error = P::Error;
    type Operation<R> = ViaOperation<P, S, R>
    where
        R: Receiver<P::Value, P::Error>;

    fn blocking(&self) -> Blocking {
        Blocking::sequence(self.predecessor.blocking(), self.successor.blocking())
    }

    fn connect<R>(self, receiver: R) -> ViaOperation<P, S, R>
    where
        R: Receiver<P::Value, P::Error>,
    {
        let successor_slot = Arc::new(Mutex::new(None));
        let predecessor_receiver = PredecessorReceiver {
            successor: self.successor,
            downstream: Downstream::new(receiver),
            successor_slot: Arc::clone(&successor_slot),
        };
        ViaOperation {
            predecessor: self.predecessor.connect(predecessor_receiver),
            successor_slot,
        }
    }
}

type Slot<S, R, T, E> = Arc<Mutex<Option<SuccessorOperation<S, R, T, E>>>>;

/// Operation state of [`ViaSender`]
pub struct ViaOperation<P, S, R>
where
    P: Sender,
    S: Sender + Send + 'static,
    R: Receiver<P::Value, P::Error>,
    P::Value: Send + 'static,
    P::Error: From<S::Error> + From<SubmitError> + Send + 'static,
{
    predecessor: P::Operation<PredecessorReceiver<S, R, P::Value, P::Error>>,
    // keeps the successor operation state alive until this is dropped.
    successor_slot: Slot<S, R, P::Value, P::Error>,
}

impl<P, S, R> OperationState for ViaOperation<P, S, R>
where
    P: Sender,
    S: Sender + Send + 'static,
    R: Receiver<P::Value, P::Error>,
    P::Value: Send + 'static,
    P::Error: From<S::Error> + From<SubmitError> + Send + 'static,
{
    fn start(&mut self) {
        self.predecessor.start();
    }
}

// the final receiver, shared between the adapter that will complete it and the fallback path that
// reports submission failures.
struct Downstream<R: Receiver<T, E>, T, E> {
    receiver: Arc<AtomicTake<R>>,
    token: R::StopToken,
    _signals: PhantomData<fn(T, E)>,
}

impl<R: Receiver<T, E>, T, E> Downstream<R, T, E> {
    fn new(receiver: R) -> Self {
        Downstream {
            token: receiver.stop_token(),
            receiver: Arc::new(AtomicTake::some(receiver)),
            _signals: PhantomData,
        }
    }

    fn set_value(self, value: T) {
        if let Some(receiver) = self.receiver.take() {
            receiver.set_value(value);
        }
    }

    fn set_error(self, error: E) {
        if let Some(receiver) = self.receiver.take() {
            receiver.set_error(error);
        }
    }

    fn set_done(self) {
        if let Some(receiver) = self.receiver.take() {
            receiver.set_done();
        }
    }
}

/// Receiver the predecessor of a [`ViaSender`] is connected to
pub struct PredecessorReceiver<S, R, T, E>
where
    S: Sender,
    R: Receiver<T, E>,
    T: Send + 'static,
    E: From<S::Error> + Send + 'static,
{
    successor: S,
    downstream: Downstream<R, T, E>,
    successor_slot: Slot<S, R, T, E>,
}

impl<S, R, T, E> PredecessorReceiver<S, R, T, E>
where
    S: Sender + Send + 'static,
    R: Receiver<T, E>,
    T: Send + 'static,
    E: From<S::Error> + From<SubmitError> + Send + 'static,
{
    // connect the successor with an adapter, store its operation state, and start it. a panic
    // along the way is delivered downstream as an error if the final receiver is still there.
    // if it is gone, the panic came from downstream of a completed successor and keeps unwinding.
    fn submit<F>(self, connect: F)
    where
        F: FnOnce(S, Downstream<R, T, E>) -> SuccessorOperation<S, R, T, E>,
    {
        let PredecessorReceiver { successor, downstream, successor_slot } = self;
        let fallback = Arc::clone(&downstream.receiver);
        let submitted = catch_unwind(AssertUnwindSafe(move || {
            let successor_op = connect(successor, downstream);
            // start needs the operation at its final address, so it runs under the slot lock.
            // nothing else ever locks the slot.
            let mut slot = successor_slot.lock().unwrap_or_else(PoisonError::into_inner);
            slot.insert(successor_op).start();
        }));
        if let Err(payload) = submitted {
            let Some(receiver) = fallback.take()
                else { resume_unwind(payload) };
            let error = SubmitError::from(PanicError::from_payload(payload));
            error!(%error, "panic while submitting successor operation");
            receiver.set_error(E::from(error));
        }
    }
}

impl<S, R, T, E> Receiver<T, E> for PredecessorReceiver<S, R, T, E>
where
    S: Sender + Send + 'static,
    R: Receiver<T, E>,
    T: Send + 'static,
    E: From<S::Error> + From<SubmitError> + Send + 'static,
{
    type StopToken = R::StopToken;

    fn set_value(self, value: T) {
        trace!("via predecessor completed with value");
        self.submit(|successor, downstream| {
            SuccessorOperation::Value(successor.connect(ValueReceiver { value, downstream }))
        });
    }

    fn set_error(self, error: E) {
        trace!("via predecessor completed with error");
        self.submit(|successor, downstream| {
            SuccessorOperation::Error(successor.connect(ErrorReceiver { error, downstream }))
        });
    }

    fn set_done(self) {
        trace!("via predecessor completed with done");
        self.submit(|successor, downstream| {
            SuccessorOperation::Done(successor.connect(DoneReceiver { downstream }))
        });
    }

    fn stop_token(&self) -> R::StopToken {
        self.downstream.token.clone()
    }
}

// operation state of the successor, connected to whichever adapter matches the predecessor's
// outcome.
enum SuccessorOperation<S, R, T, E>
where
    S: Sender,
    R: Receiver<T, E>,
    T: Send + 'static,
    E: From<S::Error> + Send + 'static,
{
    Value(S::Operation<ValueReceiver<R, T, E>>),
    Error(S::Operation<ErrorReceiver<R, T, E>>),
    Done(S::Operation<DoneReceiver<R, T, E>>),
}

impl<S, R, T, E> SuccessorOperation<S, R, T, E>
where
    S: Sender,
    R: Receiver<T, E>,
    T: Send + 'static,
    E: From<S::Error> + Send + 'static,
{
    fn start(&mut self) {
        match self {
            SuccessorOperation::Value(op) => op.start(),
            SuccessorOperation::Error(op) => op.start(),
            SuccessorOperation::Done(op) => op.start(),
        }
    }
}

/// Successor adapter that re-delivers a captured predecessor value
pub struct ValueReceiver<R: Receiver<T, E>, T, E> {
    value: T,
    downstream: Downstream<R, T, E>,
}

/// Successor adapter that re-delivers a captured predecessor error
pub struct ErrorReceiver<R: Receiver<T, E>, T, E> {
    error: E,
    downstream: Downstream<R, T, E>,
}

/// Successor adapter that re-delivers a captured predecessor done
pub struct DoneReceiver<R: Receiver<T, E>, T, E> {
    downstream: Downstream<R, T, E>,
}

// implement Receiver for an adapter. the successor's value triggers delivery of the captured
// outcome; the successor's own error or done are forwarded instead.
macro_rules! successor_adapter {
    ($adapter:ident, |$this:ident| $on_value:expr) => {
        impl<R, T, E, SV, SE> Receiver<SV, SE> for $adapter<R, T, E>
        where
            R: Receiver<T, E>,
            T: Send + 'static,
            E: From<SE> + Send + 'static,
        {
            type StopToken = R::StopToken;

            fn set_value(self, _value: SV) {
                trace!(adapter = stringify!($adapter), "via successor completed, forwarding");
                let $this = self;
                $on_value
            }

            fn set_error(self, error: SE) {
                trace!(adapter = stringify!($adapter), "via successor failed, overriding");
                self.downstream.set_error(E::from(error));
            }

            fn set_done(self) {
                trace!(adapter = stringify!($adapter), "via successor cancelled, overriding");
                self.downstream.set_done();
            }

            fn stop_token(&self) -> R::StopToken {
                self.downstream.token.clone()
            }
        }
    };
}

successor_adapter!(ValueReceiver, |this| this.downstream.set_value(this.value));
successor_adapter!(ErrorReceiver, |this| this.downstream.set_error(this.error));
successor_adapter!(DoneReceiver, |this| this.downstream.set_done());
