// senders that complete immediately with a fixed outcome.

use crate::{
    protocol::*,
    util::fatal,
};
use std::{convert::Infallible, marker::PhantomData};


/// Sender that completes inline with a value
#[derive(Debug, Clone)]
pub struct Just<T, E = Infallible> {
    value: T,
    _error: PhantomData<fn() -> E>,
}

/// Sender that completes inline with an error
#[derive(Debug, Clone)]
pub struct JustError<E, T = ()> {
    error: E,
    _value: PhantomData<fn() -> T>,
}

/// Sender that completes inline with done
#[derive(Debug, Clone)]
pub struct JustDone<T = (), E = Infallible>(PhantomData<fn() -> (T, E)>);

/// Make a sender that delivers `value`.
pub fn just<T, E>(value: T) -> Just<T, E> {
    Just { value, _error: PhantomData }
}

/// Make a sender that delivers `error`.
pub fn just_error<E, T>(error: E) -> JustError<E, T> {
    JustError { error, _value: PhantomData }
}

/// Make a sender that delivers done.
pub fn just_done<T, E>() -> JustDone<T, E> {
    JustDone(PhantomData)
}

impl<T, E> Default for JustDone<T, E> {
    fn default() -> Self {
        just_done()
    }
}

/// Operation state of the ready senders in this module
pub struct ReadyOperation<T, E, R> {
    // taken on start.
    ready: Option<(Outcome<T, E>, R)>,
}

impl<T: Send, E: Send, R: Receiver<T, E>> OperationState for ReadyOperation<T, E, R> {
    fn start(&mut self) {
        let Some((outcome, receiver)) = self.ready.take()
            else { fatal("ready operation started twice") };
        outcome.deliver(receiver);
    }
}

fn ready<T, E, R>(outcome: Outcome<T, E>, receiver: R) -> ReadyOperation<T, E, R> {
    ReadyOperation { ready: Some((outcome, receiver)) }
}

macro_rules! ready_sender {
    ($sender:ident<$($p:ident),*>, |$this:ident| $outcome:expr) => {
        impl<T: Send, E: Send> Sender for $sender<$($p),*> {
            type Value = T;
            type Error = E;
            type Operation<R> = ReadyOperation<T, E, R>
            where
                R: Receiver<T, E>;

            fn blocking(&self) -> Blocking {
                Blocking::AlwaysInline
            }

            fn connect<R>(self, receiver: R) -> ReadyOperation<T, E, R>
            where
                R: Receiver<T, E>,
            {
                let $this = self;
                ready($outcome, receiver)
            }
        }
    };
}

ready_sender!(Just<T, E>, |this| Outcome::Value(this.value));
ready_sender!(JustError<E, T>, |this| Outcome::Error(this.error));
ready_sender!(JustDone<T, E>, |_this| Outcome::Done);
