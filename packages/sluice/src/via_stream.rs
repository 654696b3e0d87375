// stream adapter that transfers every pulled element onto a scheduler.

use crate::{
    protocol::*,
    error::SubmitError,
    via::{via, ViaSender},
};


/// Stream whose `next` and `cleanup` senders each complete on a scheduler's context
///
/// See [`via_stream`].
#[derive(Debug, Clone)]
pub struct ViaStream<C, St> {
    scheduler: C,
    stream: St,
}

/// Wrap `stream` so that each of its senders is composed with [`via`] onto `scheduler`.
pub fn via_stream<C, St>(scheduler: C, stream: St) -> ViaStream<C, St> {
    ViaStream { scheduler, stream }
}

impl<C, St> Stream for ViaStream<C, St>
where
    C: Scheduler,
    C::Schedule: Send + 'static,
    St: Stream,
    <St::Next as Sender>::Value: Send + 'static,
    <St::Next as Sender>::Error: From<<C::Schedule as Sender>::Error>
        + From<SubmitError>
        + Send
        + 'static,
    <St::Cleanup as Sender>::Error: From<<C::Schedule as Sender>::Error>
        + From<SubmitError>
        + Send
        + 'static,
{
    type Next = ViaSender<St::Next, C::Schedule>;
    type Cleanup = ViaSender<St::Cleanup, C::Schedule>;

    fn next(&mut self) -> Self::Next {
        via(self.scheduler.schedule(), self.stream.next())
    }

    fn cleanup(&mut self) -> Self::Cleanup {
        via(self.scheduler.schedule(), self.stream.cleanup())
    }
}
