// shared stop source and its tokens.

use super::StopToken;
use smallvec::SmallVec;
use std::{
    fmt::{self, Formatter, Debug},
    mem::take,
    sync::{
        atomic::{
            Ordering::{Acquire, AcqRel, Relaxed},
            AtomicBool,
        },
        Arc,
        Mutex,
    },
};


// this many callbacks may be registered without heap allocating the callback list.
const INLINE_CALLBACKS: usize = 2;

type Callback = Box<dyn FnOnce() + Send>;


/// Requester side of a cancellation scope
///
/// Hands out [`SourceToken`]s. Calling [`request_stop`](Self::request_stop) runs every callback
/// registered through them, once.
pub struct StopSource(Arc<Shared>);

// source shared state.
struct Shared {
    // once true, never becomes false again. only transitions while lockable is locked.
    stopped: AtomicBool,
    lockable: Mutex<Lockable>,
}

// source lockable state.
struct Lockable {
    next_id: u64,
    // purged when stopped transitions to true.
    callbacks: SmallVec<[(u64, Callback); INLINE_CALLBACKS]>,
}

impl StopSource {
    /// Construct without a stop requested.
    pub fn new() -> Self {
        StopSource(Arc::new(Shared {
            stopped: AtomicBool::new(false),
            lockable: Mutex::new(Lockable {
                next_id: 0,
                callbacks: SmallVec::new(),
            }),
        }))
    }

    /// Get a token for this source.
    pub fn token(&self) -> SourceToken {
        SourceToken(Arc::clone(&self.0))
    }

    /// Request a stop, running all registered callbacks on the calling thread.
    ///
    /// Returns false if a stop had already been requested, in which case nothing happens.
    pub fn request_stop(&self) -> bool {
        let callbacks = {
            let mut lock = self.0.lockable.lock().unwrap();
            if self.0.stopped.swap(true, AcqRel) {
                return false;
            }
            take(&mut lock.callbacks)
        };
        debug!(callbacks = callbacks.len(), "stop requested");
        // run outside the lock so callbacks may register or deregister freely
        for (_, callback) in callbacks {
            callback();
        }
        true
    }

    /// Whether a stop has been requested.
    pub fn stop_requested(&self) -> bool {
        self.0.stopped.load(Acquire)
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for StopSource {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("StopSource")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

/// Token derived from a [`StopSource`]
#[derive(Clone)]
pub struct SourceToken(Arc<Shared>);

impl StopToken for SourceToken {
    type Registration = StopRegistration;

    fn stop_possible(&self) -> bool {
        true
    }

    fn stop_requested(&self) -> bool {
        self.0.stopped.load(Acquire)
    }

    fn register<F>(&self, callback: F) -> StopRegistration
    where
        F: FnOnce() + Send + 'static,
    {
        let mut lock = self.0.lockable.lock().unwrap();
        // stopped only transitions under the lock, so relaxed is enough here
        if self.0.stopped.load(Relaxed) {
            drop(lock);
            callback();
            return StopRegistration { shared: Arc::clone(&self.0), id: None };
        }
        let id = lock.next_id;
        lock.next_id += 1;
        lock.callbacks.push((id, Box::new(callback)));
        StopRegistration { shared: Arc::clone(&self.0), id: Some(id) }
    }
}

impl Debug for SourceToken {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("SourceToken")
            .field("stop_requested", &self.stop_requested())
            .finish()
    }
}

/// Registration of a callback with a [`StopSource`]. Deregisters when dropped.
///
/// Dropping a registration while its callback is running on another thread does not wait for the
/// callback to finish. Callbacks must own whatever state they touch.
pub struct StopRegistration {
    shared: Arc<Shared>,
    // none if the callback has already run at registration time.
    id: Option<u64>,
}

impl Drop for StopRegistration {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            let mut lock = self.shared.lockable.lock().unwrap();
            // not found if the callback was already taken by request_stop
            lock.callbacks.retain(|(other, _)| *other != id);
        }
    }
}
