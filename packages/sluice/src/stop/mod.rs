// stop token contract and the stock token types.

mod source;

pub use self::source::{StopSource, SourceToken, StopRegistration};


/// Capability for observing cancellation requests
///
/// Tokens are cheap handles. Many tokens may derive from one cancellation source, and none of
/// them own it.
pub trait StopToken: Clone + Send + Sync + 'static {
    /// Whether no instance of this type can ever be stopped
    ///
    /// Operations that only complete through cancellation reject such token types at build time.
    const NEVER_STOPPABLE: bool = false;

    /// Handle that keeps a callback registered. Dropping it deregisters the callback.
    type Registration: Send;

    /// Whether a stop may ever be requested through this token. Fixed for the token's lifetime.
    fn stop_possible(&self) -> bool;

    /// Whether a stop has been requested.
    fn stop_requested(&self) -> bool;

    /// Register a callback to be run once when a stop is requested.
    ///
    /// If a stop was already requested, the callback runs immediately, before this returns.
    fn register<F>(&self, callback: F) -> Self::Registration
    where
        F: FnOnce() + Send + 'static;
}

/// Stop token that can never be stopped
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct UnstoppableToken;

impl StopToken for UnstoppableToken {
    const NEVER_STOPPABLE: bool = true;

    type Registration = ();

    fn stop_possible(&self) -> bool {
        false
    }

    fn stop_requested(&self) -> bool {
        false
    }

    fn register<F>(&self, _callback: F)
    where
        F: FnOnce() + Send + 'static,
    {}
}

// an absent token behaves like an unstoppable one, but only at runtime.
impl<K: StopToken> StopToken for Option<K> {
    const NEVER_STOPPABLE: bool = K::NEVER_STOPPABLE;

    type Registration = Option<K::Registration>;

    fn stop_possible(&self) -> bool {
        self.as_ref().is_some_and(K::stop_possible)
    }

    fn stop_requested(&self) -> bool {
        self.as_ref().is_some_and(K::stop_requested)
    }

    fn register<F>(&self, callback: F) -> Self::Registration
    where
        F: FnOnce() + Send + 'static,
    {
        self.as_ref().map(|token| token.register(callback))
    }
}
