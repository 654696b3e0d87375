// sender that only ever completes through cancellation.

use crate::{
    protocol::*,
    stop::StopToken,
    just::{just_done, JustDone},
    util::{AtomicTake, fatal},
};
use std::{convert::Infallible, marker::PhantomData, sync::Arc};


/// Sender that never produces a value or error, and completes with done once cancelled
///
/// Since it never delivers either payload, its value type `T` and error type `E` can be whatever
/// the surrounding composition needs.
///
/// Connecting it to a receiver whose stop token type can never be stopped is rejected at build
/// time, since the operation could then never complete:
///
/// ```compile_fail
/// use sluice::{never_sender, sync_wait};
/// use std::convert::Infallible;
///
/// // sync_wait's receiver carries an UnstoppableToken
/// let _ = sync_wait(never_sender::<(), Infallible>());
/// ```
///
/// A receiver whose token instance reports that stopping is not possible is rejected with a
/// panic at connect time.
#[derive(Debug, Copy, Clone)]
pub struct NeverSender<T = (), E = Infallible>(PhantomData<fn() -> (T, E)>);

/// Make a [`NeverSender`].
pub fn never_sender<T, E>() -> NeverSender<T, E> {
    NeverSender(PhantomData)
}

impl<T, E> Default for NeverSender<T, E> {
    fn default() -> Self {
        never_sender()
    }
}

/// Operation state of [`NeverSender`]
pub struct NeverOperation<R: Receiver<T, E>, T, E> {
    // taken by the stop callback, which is the only completion path.
    receiver: Arc<AtomicTake<R>>,
    token: R::StopToken,
    // some once started. dropping it deregisters the callback.
    registration: Option<<R::StopToken as StopToken>::Registration>,
    _signals: PhantomData<fn(T, E)>,
}

impl<R: Receiver<T, E>, T, E> NeverOperation<R, T, E> {
    const STOPPABLE: () = assert!(
        !<R::StopToken as StopToken>::NEVER_STOPPABLE,
        "never_sender should not be used with a stop token type that can never be stopped",
    );
}

impl<T, E> Sender for NeverSender<T, E> {
    type Value = T;
    type Error = E;
    type Operation<R> = NeverOperation<R, T, E>
    where
        R: Receiver<T, E>;

    fn connect<R>(self, receiver: R) -> NeverOperation<R, T, E>
    where
        R: Receiver<T, E>,
    {
        let () = NeverOperation::<R, T, E>::STOPPABLE;
        let token = receiver.stop_token();
        assert!(
            token.stop_possible(),
            "never_sender connected to a receiver whose stop token can never be stopped",
        );
        NeverOperation {
            receiver: Arc::new(AtomicTake::some(receiver)),
            token,
            registration: None,
            _signals: PhantomData,
        }
    }
}

impl<R: Receiver<T, E>, T, E> OperationState for NeverOperation<R, T, E> {
    fn start(&mut self) {
        if self.registration.is_some() {
            fatal("never_sender operation started twice");
        }
        let receiver = Arc::clone(&self.receiver);
        self.registration = Some(self.token.register(move || {
            if let Some(receiver) = receiver.take() {
                debug!("never_sender cancelled");
                receiver.set_done();
            }
        }));
    }
}

/// Stream whose next element never arrives
///
/// [`next`](Stream::next) is a [`NeverSender`], so it completes only by cancellation.
/// [`cleanup`](Stream::cleanup) completes immediately with done.
#[derive(Debug, Copy, Clone)]
pub struct NeverStream<T = (), E = Infallible>(PhantomData<fn() -> (T, E)>);

/// Make a [`NeverStream`].
pub fn never_stream<T, E>() -> NeverStream<T, E> {
    NeverStream(PhantomData)
}

impl<T, E> Default for NeverStream<T, E> {
    fn default() -> Self {
        never_stream()
    }
}

impl<T, E: Send> Stream for NeverStream<T, E> {
    type Next = NeverSender<T, E>;
    type Cleanup = JustDone<(), E>;

    fn next(&mut self) -> NeverSender<T, E> {
        never_sender()
    }

    fn cleanup(&mut self) -> JustDone<(), E> {
        just_done()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{stop::*, testing::*};
    use rand::prelude::*;
    use std::{thread, time::Duration};

    #[test]
    fn completes_once_on_cancel() {
        let source = StopSource::new();
        let recorder = Recorder::<(), Infallible>::new();

        let mut op = never_sender().connect(recorder.receiver_with(source.token()));
        op.start();
        assert!(recorder.outcomes().is_empty());

        assert!(source.request_stop());
        assert_eq!(recorder.outcomes(), vec![Outcome::Done]);

        // a second request is a no-op
        assert!(!source.request_stop());
        assert_eq!(recorder.outcomes(), vec![Outcome::Done]);
    }

    #[test]
    fn already_stopped_completes_on_start() {
        let source = StopSource::new();
        source.request_stop();
        let recorder = Recorder::<(), Infallible>::new();

        let mut op = never_sender().connect(recorder.receiver_with(source.token()));
        assert!(recorder.outcomes().is_empty());
        op.start();
        assert_eq!(recorder.outcomes(), vec![Outcome::Done]);
    }

    #[test]
    #[should_panic(expected = "stop token can never be stopped")]
    fn rejects_unstoppable_token_instance() {
        let recorder = Recorder::<(), Infallible>::new();
        let absent: Option<SourceToken> = None;
        let _ = never_sender().connect(recorder.receiver_with(absent));
    }

    #[test]
    fn racing_stop_requests_complete_once() {
        let mut rng = new_rng();
        for _ in 0..50 {
            let source = Arc::new(StopSource::new());
            let recorder = Recorder::<(), Infallible>::new();
            let mut op = never_sender().connect(recorder.receiver_with(source.token()));
            op.start();

            let joins = (0..4)
                .map(|_| {
                    let source = Arc::clone(&source);
                    let delay = Duration::from_micros(rng.gen_range(0..200));
                    thread::spawn(move || {
                        thread::sleep(delay);
                        source.request_stop()
                    })
                })
                .collect::<Vec<_>>();
            let winners = joins.into_iter()
                .map(|join| join.join().unwrap())
                .filter(|&won| won)
                .count();

            assert_eq!(winners, 1);
            assert_eq!(recorder.outcomes(), vec![Outcome::Done]);
        }
    }

    #[test]
    fn dropped_operation_never_completes() {
        let source = StopSource::new();
        let recorder = Recorder::<(), Infallible>::new();

        let mut op = never_sender().connect(recorder.receiver_with(source.token()));
        op.start();
        drop(op);
        assert!(source.request_stop());

        assert!(recorder.outcomes().is_empty());
    }

    #[test]
    fn drop_racing_stop_completes_at_most_once() {
        let mut rng = new_rng();
        for _ in 0..50 {
            let source = StopSource::new();
            let recorder = Recorder::<(), Infallible>::new();
            let mut op = never_sender().connect(recorder.receiver_with(source.token()));
            op.start();

            let drop_delay = Duration::from_micros(rng.gen_range(0..200));
            let dropper = thread::spawn(move || {
                thread::sleep(drop_delay);
                drop(op);
            });
            thread::sleep(Duration::from_micros(rng.gen_range(0..200)));
            source.request_stop();
            dropper.join().unwrap();

            let outcomes = recorder.outcomes();
            assert!(outcomes.len() <= 1);
            assert!(outcomes.iter().all(|outcome| *outcome == Outcome::Done));
        }
    }

    #[test]
    fn never_stream_shape() {
        let source = StopSource::new();
        let recorder = Recorder::<(), Infallible>::new();
        let mut stream = never_stream::<(), Infallible>();

        let mut cleanup = stream.cleanup().connect(recorder.receiver());
        cleanup.start();
        assert_eq!(recorder.outcomes(), vec![Outcome::Done]);

        let mut next = stream.next().connect(recorder.receiver_with(source.token()));
        next.start();
        assert_eq!(recorder.outcomes().len(), 1);
        source.request_stop();
        assert_eq!(recorder.outcomes(), vec![Outcome::Done, Outcome::Done]);
    }
}
