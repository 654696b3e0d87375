//! Tokio scheduler.

use crate::{
    protocol::*,
    stop::StopToken,
    error::ScheduleError,
    util::fatal,
};
use tokio::runtime::Handle;


/// Scheduler that transfers execution onto a tokio runtime
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Schedule onto the runtime behind `handle`.
    pub fn new(handle: Handle) -> Self {
        TokioScheduler { handle }
    }

    /// Schedule onto the runtime the calling thread is in.
    ///
    /// Panics if not called from within a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    type Schedule = ScheduleSender;

    fn schedule(&self) -> ScheduleSender {
        ScheduleSender { handle: self.handle.clone() }
    }
}

/// Sender that completes on a tokio runtime worker
///
/// Completes with done instead if a stop was requested by the time the task runs, and with
/// [`ScheduleError::RuntimeShutdown`] if the runtime drops the task without running it.
#[derive(Debug, Clone)]
pub struct ScheduleSender {
    handle: Handle,
}

/// Operation state of [`ScheduleSender`]
pub struct ScheduleOperation<R> {
    handle: Handle,
    // taken on start.
    receiver: Option<R>,
}

impl Sender for ScheduleSender {
    type Value = ();
    type Error = ScheduleError;
    type Operation<R> = ScheduleOperation<R>
    where
        R: Receiver<(), ScheduleError>;

    fn blocking(&self) -> Blocking {
        Blocking::Never
    }

    fn connect<R>(self, receiver: R) -> ScheduleOperation<R>
    where
        R: Receiver<(), ScheduleError>,
    {
        ScheduleOperation { handle: self.handle, receiver: Some(receiver) }
    }
}

impl<R: Receiver<(), ScheduleError>> OperationState for ScheduleOperation<R> {
    fn start(&mut self) {
        let Some(receiver) = self.receiver.take()
            else { fatal("schedule operation started twice") };
        let task = ScheduledTask(Some(receiver));
        // the join handle is not needed, completion goes through the receiver
        drop(self.handle.spawn(async move { task.run() }));
    }
}

// receiver in transit to a runtime worker. delivers an error if dropped before running.
struct ScheduledTask<R: Receiver<(), ScheduleError>>(Option<R>);

impl<R: Receiver<(), ScheduleError>> ScheduledTask<R> {
    fn run(mut self) {
        if let Some(receiver) = self.0.take() {
            if receiver.stop_token().stop_requested() {
                trace!("scheduled task stopped before running");
                receiver.set_done();
            } else {
                receiver.set_value(());
            }
        }
    }
}

impl<R: Receiver<(), ScheduleError>> Drop for ScheduledTask<R> {
    fn drop(&mut self) {
        if let Some(receiver) = self.0.take() {
            warn!("scheduled task dropped by runtime without running");
            receiver.set_error(ScheduleError::RuntimeShutdown);
        }
    }
}
