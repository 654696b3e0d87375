// bridge from futures to senders.
//
// a SenderTask owns an Arc<Task>. the task is its own waker, through ArcWake, and polls the future
// inline on whichever thread starts it or wakes it. the task's state machine:
//
//   Connected --start--> Polling --pending--> Waiting --wake--> Polling ...
//                          |  ^
//                     wake |  | pending
//                          v  |
//                        Repoll
//
//   Polling --ready--> Complete
//
// while Polling, the future and receiver are held by the polling thread, not the mutex, so the
// mutex is never held while user code runs. a wake that arrives mid-poll marks Repoll, and the
// polling thread polls again instead of parking. delivery happens only after Complete is stored
// and the lock released.
//
// cancellation is not wired into the future: the future runs until it resolves by itself, and done
// is never delivered.

use crate::{
    protocol::*,
    error::PanicError,
    util::{AbortOnDrop, fatal},
};
use futures::{
    future::{self, CatchUnwind},
    task::{waker_ref, ArcWake},
    FutureExt,
};
use std::{
    future::Future,
    mem::replace,
    panic::AssertUnwindSafe,
    pin::Pin,
    sync::{Arc, Mutex},
    task::{Context, Poll},
};


/// Sender that drives a future and delivers its result
///
/// See [`awaitable_sender`].
#[derive(Debug, Clone)]
pub struct AwaitableSender<F> {
    future: F,
}

/// Make a sender from a future resolving to a `Result`.
///
/// `Ok` is delivered as the value signal and `Err` as the error signal. If polling the future
/// panics, the panic is caught and delivered as an error converted from [`PanicError`]. Done is
/// never delivered.
///
/// The future is polled on the thread that starts the operation until it is pending, and after
/// that on whichever thread wakes it.
pub fn awaitable_sender<F, T, E>(future: F) -> AwaitableSender<F>
where
    F: Future<Output = Result<T, E>>,
{
    AwaitableSender { future }
}

/// Future adapter made by [`from_future`]
pub type Infallibly<F> =
    future::Map<F, fn(<F as Future>::Output) -> Result<<F as Future>::Output, PanicError>>;

/// Make a sender from a future whose output cannot fail.
///
/// The error type is [`PanicError`], which is only delivered if polling panics.
pub fn from_future<F: Future>(future: F) -> AwaitableSender<Infallibly<F>> {
    let ok: fn(F::Output) -> Result<F::Output, PanicError> = Ok;
    awaitable_sender(future.map(ok))
}

impl<F, T, E> Sender for AwaitableSender<F>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<PanicError> + Send + 'static,
{
    type Value = T;
    type Error = E;
    type Operation<R> = SenderTask<F, R>
    where
        R: Receiver<T, E>;

    fn connect<R>(self, receiver: R) -> SenderTask<F, R>
    where
        R: Receiver<T, E>,
    {
        let future = Box::pin(AssertUnwindSafe(self.future).catch_unwind());
        SenderTask(Arc::new(Task {
            state: Mutex::new(State::Connected(future, receiver)),
        }))
    }
}

/// Operation state of [`AwaitableSender`]
pub struct SenderTask<F, R>(Arc<Task<F, R>>);

type Guarded<F> = Pin<Box<CatchUnwind<AssertUnwindSafe<F>>>>;

struct Task<F, R> {
    state: Mutex<State<F, R>>,
}

enum State<F, R> {
    // not started yet.
    Connected(Guarded<F>, R),
    // some thread is polling and holds the future and receiver.
    Polling,
    // woken while polling. the polling thread must poll again.
    Repoll,
    // pending, parked until woken.
    Waiting(Guarded<F>, R),
    // resolved and delivered, or delivering.
    Complete,
}

impl<F, R, T, E> OperationState for SenderTask<F, R>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<PanicError> + Send + 'static,
    R: Receiver<T, E>,
{
    fn start(&mut self) {
        let mut lock = self.0.state.lock().unwrap();
        let State::Connected(future, receiver) = replace(&mut *lock, State::Polling)
            else { fatal("awaitable sender operation started twice") };
        drop(lock);
        self.0.run(future, receiver);
    }
}

impl<F, R, T, E> Task<F, R>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<PanicError> + Send + 'static,
    R: Receiver<T, E>,
{
    // poll until pending with no wake in between, or until resolved. state must be Polling.
    fn run(self: &Arc<Self>, mut future: Guarded<F>, receiver: R) {
        let waker = waker_ref(self);
        let mut cx = Context::from_waker(&waker);
        loop {
            if let Poll::Ready(result) = future.as_mut().poll(&mut cx) {
                *self.state.lock().unwrap() = State::Complete;
                drop(future);
                let outcome = match result {
                    Ok(Ok(value)) => Outcome::Value(value),
                    Ok(Err(error)) => Outcome::Error(error),
                    Err(payload) => {
                        let error = PanicError::from_payload(payload);
                        debug!(%error, "awaited future panicked");
                        Outcome::Error(E::from(error))
                    }
                };
                let guard = AbortOnDrop::new("receiver panicked while completing awaitable sender");
                outcome.deliver(receiver);
                guard.disarm();
                return;
            }

            let mut lock = self.state.lock().unwrap();
            match replace(&mut *lock, State::Polling) {
                State::Polling => {
                    *lock = State::Waiting(future, receiver);
                    return;
                }
                State::Repoll => {
                    trace!("awaited future woken while polling");
                }
                _ => fatal("awaitable sender task in unexpected state after poll"),
            }
        }
    }
}

impl<F, R, T, E> ArcWake for Task<F, R>
where
    F: Future<Output = Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<PanicError> + Send + 'static,
    R: Receiver<T, E>,
{
    fn wake_by_ref(arc_self: &Arc<Self>) {
        let mut lock = arc_self.state.lock().unwrap();
        match replace(&mut *lock, State::Complete) {
            State::Waiting(future, receiver) => {
                *lock = State::Polling;
                drop(lock);
                arc_self.run(future, receiver);
            }
            State::Polling | State::Repoll => *lock = State::Repoll,
            // stale wake after completion, or before start.
            state => *lock = state,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{sync_wait::sync_wait, testing::*};
    use std::thread;
    use tokio::sync::oneshot;

    #[test]
    fn delivers_each_result() {
        assert_eq!(sync_wait(awaitable_sender(async { Ok::<_, TestError>(42) })), Ok(Some(42)));
        assert_eq!(
            sync_wait(awaitable_sender(async { Err::<i32, _>(TestError::Predecessor) })),
            Err(TestError::Predecessor),
        );
        assert_eq!(sync_wait(from_future(async {})), Ok(Some(())));
    }

    #[test]
    fn panic_becomes_error() {
        let sender = awaitable_sender(async {
            if true {
                panic!("future blew up");
            }
            Ok::<i32, TestError>(1)
        });
        assert_eq!(sync_wait(sender), Err(TestError::Panicked("future blew up".to_owned())));
    }

    #[test]
    fn resumes_on_waking_thread() {
        let (send, recv) = oneshot::channel::<i32>();
        let recorder = Recorder::<i32, TestError>::new();
        let mut op = awaitable_sender(async move {
            recv.await.map_err(|_| TestError::Predecessor)
        }).connect(recorder.receiver());

        op.start();
        assert!(recorder.outcomes().is_empty());

        let waking_thread = thread::spawn(move || {
            send.send(5).unwrap();
            thread::current().id()
        }).join().unwrap();

        assert_eq!(recorder.outcomes(), vec![Outcome::Value(5)]);
        assert_eq!(recorder.threads(), vec![waking_thread]);
    }

    #[test]
    fn wake_while_polling_polls_again() {
        let mut yielded = false;
        let sender = awaitable_sender(future::poll_fn(move |cx| {
            if yielded {
                Poll::Ready(Ok::<_, TestError>(3))
            } else {
                yielded = true;
                cx.waker().wake_by_ref();
                Poll::Pending
            }
        }));
        assert_eq!(sync_wait(sender), Ok(Some(3)));
    }

    #[test]
    fn abandoned_future_reports_error() {
        let (send, recv) = oneshot::channel::<i32>();
        let recorder = Recorder::<i32, TestError>::new();
        let mut op = awaitable_sender(async move {
            recv.await.map_err(|_| TestError::Predecessor)
        }).connect(recorder.receiver());

        op.start();
        drop(send);

        // never done, even though the future can no longer produce a value
        assert_eq!(recorder.outcomes(), vec![Outcome::Error(TestError::Predecessor)]);
    }
}
