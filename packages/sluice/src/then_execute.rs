// schedule-then-transform convenience.

use crate::{
    protocol::*,
    map::{map, Map},
    via::{via, ViaSender},
};


/// Run `predecessor`, transfer onto `scheduler`'s context, then apply `func` to the value there.
///
/// Errors and done from either side are forwarded as [`via`] does.
pub fn then_execute<C, P, F, U>(
    scheduler: &C,
    predecessor: P,
    func: F,
) -> Map<ViaSender<P, C::Schedule>, F>
where
    C: Scheduler,
    P: Sender,
    F: FnOnce(P::Value) -> U,
{
    map(via(scheduler.schedule(), predecessor), func)
}
