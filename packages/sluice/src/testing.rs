// shared test fixtures.

use crate::{
    protocol::*,
    stop::{StopToken, UnstoppableToken},
    error::{PanicError, ScheduleError, SubmitError},
};
use rand::prelude::*;
use rand_pcg::Pcg32;
use std::{
    convert::Infallible,
    sync::{Arc, Condvar, Mutex},
    thread::{self, ThreadId},
};


// records every signal delivered to its receivers, along with the delivering thread.
pub(crate) struct Recorder<T, E>(Arc<Records<T, E>>);

struct Records<T, E> {
    records: Mutex<Vec<(Outcome<T, E>, ThreadId)>>,
    cond: Condvar,
}

impl<T, E> Recorder<T, E> {
    pub(crate) fn new() -> Self {
        Recorder(Arc::new(Records {
            records: Mutex::new(Vec::new()),
            cond: Condvar::new(),
        }))
    }

    pub(crate) fn receiver(&self) -> RecordingReceiver<T, E, UnstoppableToken> {
        self.receiver_with(UnstoppableToken)
    }

    pub(crate) fn receiver_with<K>(&self, token: K) -> RecordingReceiver<T, E, K> {
        RecordingReceiver { records: Arc::clone(&self.0), token }
    }

    // drain everything recorded so far.
    pub(crate) fn take(&self) -> Vec<Outcome<T, E>> {
        self.0.records.lock().unwrap()
            .drain(..)
            .map(|(outcome, _)| outcome)
            .collect()
    }

    #[cfg(feature = "futures")]
    pub(crate) fn threads(&self) -> Vec<ThreadId> {
        self.0.records.lock().unwrap()
            .iter()
            .map(|&(_, thread)| thread)
            .collect()
    }

    // block until something is recorded, then remove and return the first record.
    pub(crate) fn wait_one(&self) -> (Outcome<T, E>, ThreadId) {
        let mut lock = self.0.records.lock().unwrap();
        while lock.is_empty() {
            lock = self.0.cond.wait(lock).unwrap();
        }
        lock.remove(0)
    }
}

impl<T: Clone, E: Clone> Recorder<T, E> {
    pub(crate) fn outcomes(&self) -> Vec<Outcome<T, E>> {
        self.0.records.lock().unwrap()
            .iter()
            .map(|(outcome, _)| outcome.clone())
            .collect()
    }
}

impl<T, E> Clone for Recorder<T, E> {
    fn clone(&self) -> Self {
        Recorder(Arc::clone(&self.0))
    }
}

pub(crate) struct RecordingReceiver<T, E, K> {
    records: Arc<Records<T, E>>,
    token: K,
}

impl<T, E, K> RecordingReceiver<T, E, K> {
    fn record(self, outcome: Outcome<T, E>) {
        self.records.records.lock().unwrap().push((outcome, thread::current().id()));
        self.records.cond.notify_all();
    }
}

impl<T, E, K> Receiver<T, E> for RecordingReceiver<T, E, K>
where
    T: Send + 'static,
    E: Send + 'static,
    K: StopToken,
{
    type StopToken = K;

    fn set_value(self, value: T) {
        self.record(Outcome::Value(value));
    }

    fn set_error(self, error: E) {
        self.record(Outcome::Error(error));
    }

    fn set_done(self) {
        self.record(Outcome::Done);
    }

    fn stop_token(&self) -> K {
        self.token.clone()
    }
}

// error payload for tests, convertible from every error the library produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum TestError {
    Predecessor,
    Successor,
    Submit(String),
    Schedule,
    Panicked(String),
}

impl From<Infallible> for TestError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

impl From<SubmitError> for TestError {
    fn from(e: SubmitError) -> Self {
        TestError::Submit(e.panic().message().to_owned())
    }
}

impl From<ScheduleError> for TestError {
    fn from(_: ScheduleError) -> Self {
        TestError::Schedule
    }
}

impl From<PanicError> for TestError {
    fn from(e: PanicError) -> Self {
        TestError::Panicked(e.message().to_owned())
    }
}

pub(crate) fn new_rng() -> impl Rng {
    Pcg32::from_seed(0xdeadbeefdeadbeefdeadbeefdeadbeefu128.to_le_bytes())
}
