// blocking driver for running a sender to completion on the calling thread.

use crate::{
    protocol::*,
    stop::{StopToken, UnstoppableToken},
};
use std::sync::{Arc, Condvar, Mutex};


/// Connect and start `sender`, then block the calling thread until it completes.
///
/// Returns `Ok(Some(value))` on the value signal, `Err(error)` on the error signal, and `Ok(None)`
/// on done. The receiver's stop token can never be stopped, so a sender that only completes
/// through cancellation cannot be waited on this way. Use [`sync_wait_with`] for those.
pub fn sync_wait<S>(sender: S) -> Result<Option<S::Value>, S::Error>
where
    S: Sender,
    S::Value: Send + 'static,
    S::Error: Send + 'static,
{
    sync_wait_with(sender, UnstoppableToken)
}

/// Like [`sync_wait`], but the receiver hands out `token` as its stop token.
pub fn sync_wait_with<S, K>(sender: S, token: K) -> Result<Option<S::Value>, S::Error>
where
    S: Sender,
    S::Value: Send + 'static,
    S::Error: Send + 'static,
    K: StopToken,
{
    let signal = Arc::new(Signal {
        outcome: Mutex::new(None),
        cond: Condvar::new(),
    });
    let receiver = SyncWaitReceiver { signal: Arc::clone(&signal), token };

    let mut op = sender.connect(receiver);
    op.start();

    // block until notified. the operation state must outlive its completion, so it is only
    // dropped after this.
    let mut lock = signal.outcome.lock().unwrap();
    let outcome = loop {
        if let Some(outcome) = lock.take() {
            break outcome;
        }
        lock = signal.cond.wait(lock).unwrap();
    };
    drop(lock);
    drop(op);
    outcome.into_result()
}

// synchronization signal
struct Signal<T, E> {
    outcome: Mutex<Option<Outcome<T, E>>>,
    cond: Condvar,
}

struct SyncWaitReceiver<T, E, K> {
    signal: Arc<Signal<T, E>>,
    token: K,
}

impl<T, E, K> SyncWaitReceiver<T, E, K> {
    fn notify(self, outcome: Outcome<T, E>) {
        let mut lock = self.signal.outcome.lock().unwrap();
        *lock = Some(outcome);
        self.signal.cond.notify_one();
    }
}

impl<T, E, K> Receiver<T, E> for SyncWaitReceiver<T, E, K>
where
    T: Send + 'static,
    E: Send + 'static,
    K: StopToken,
{
    type StopToken = K;

    fn set_value(self, value: T) {
        self.notify(Outcome::Value(value));
    }

    fn set_error(self, error: E) {
        self.notify(Outcome::Error(error));
    }

    fn set_done(self) {
        self.notify(Outcome::Done);
    }

    fn stop_token(&self) -> K {
        self.token.clone()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{just::*, never::never_sender, stop::StopSource, testing::*};
    use std::{thread, time::Duration};

    #[test]
    fn returns_each_signal() {
        assert_eq!(sync_wait(just::<_, TestError>(3)), Ok(Some(3)));
        assert_eq!(
            sync_wait(just_error::<_, i32>(TestError::Predecessor)),
            Err(TestError::Predecessor),
        );
        assert_eq!(sync_wait(just_done::<i32, TestError>()), Ok(None));
    }

    #[test]
    fn waits_for_cancellation_from_other_thread() {
        let source = Arc::new(StopSource::new());
        let stopper = {
            let source = Arc::clone(&source);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                source.request_stop()
            })
        };
        let result = sync_wait_with(never_sender::<i32, TestError>(), source.token());
        assert!(stopper.join().unwrap());
        assert_eq!(result, Ok(None));
    }
}
