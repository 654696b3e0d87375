// value-mapping combinator.

use crate::protocol::*;


/// Sender that transforms the value of another sender
#[derive(Debug, Clone)]
pub struct Map<S, F> {
    sender: S,
    func: F,
}

/// Make a sender that applies `func` to the value of `sender`. Errors and done pass through.
pub fn map<S, F>(sender: S, func: F) -> Map<S, F> {
    Map { sender, func }
}

/// Receiver adapter used by [`Map`]
pub struct MapReceiver<R, F> {
    receiver: R,
    func: F,
}

impl<S, F, U> Sender for Map<S, F>
where
    S: Sender,
    F: FnOnce(S::Value) -> U + Send + 'static,
{
    type Value = U;
    type Error = S::Error;
    type Operation<R> = S::Operation<MapReceiver<R, F>>
    where
        R: Receiver<U, S::Error>;

    fn blocking(&self) -> Blocking {
        self.sender.blocking()
    }

    fn connect<R>(self, receiver: R) -> Self::Operation<R>
    where
        R: Receiver<U, S::Error>,
    {
        self.sender.connect(MapReceiver { receiver, func: self.func })
    }
}

impl<R, F, T, U, E> Receiver<T, E> for MapReceiver<R, F>
where
    R: Receiver<U, E>,
    F: FnOnce(T) -> U + Send + 'static,
{
    type StopToken = R::StopToken;

    fn set_value(self, value: T) {
        self.receiver.set_value((self.func)(value));
    }

    fn set_error(self, error: E) {
        self.receiver.set_error(error);
    }

    fn set_done(self) {
        self.receiver.set_done();
    }

    fn stop_token(&self) -> R::StopToken {
        self.receiver.stop_token()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::{just::*, testing::*};

    #[test]
    fn maps_value_only() {
        let recorder = Recorder::<String, TestError>::new();

        let mut op = map(just(21), |x: i32| (x * 2).to_string()).connect(recorder.receiver());
        op.start();
        let mut op = map(just_error(TestError::Predecessor), |x: i32| x.to_string())
            .connect(recorder.receiver());
        op.start();
        let mut op = map(just_done(), |x: i32| x.to_string()).connect(recorder.receiver());
        op.start();

        assert_eq!(recorder.outcomes(), vec![
            Outcome::Value("42".to_owned()),
            Outcome::Error(TestError::Predecessor),
            Outcome::Done,
        ]);
    }
}
