//! Search control: stop and abort flags, pondering state and the clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::search::limits::SearchLimits;

/// Shared by every worker of one search and by the protocol thread.
///
/// Two flags end a search. `stop` comes from outside (`stop`, `quit`) and
/// is shared with the protocol layer. `abort` is raised by the main worker
/// when it has finished, to release the helpers.
///
/// While pondering the search never stops on its own; `ponderhit` turns
/// pondering off and restarts the clock.
pub struct SearchControl {
    stop: Arc<AtomicBool>,
    abort: AtomicBool,
    pondering: AtomicBool,
    infinite: bool,
    start: Mutex<Instant>,
}

impl SearchControl {
    /// Control for a search with the given limits. The clock starts now.
    pub fn new(stop: Arc<AtomicBool>, limits: &SearchLimits) -> Self {
        Self {
            stop,
            abort: AtomicBool::new(false),
            pondering: AtomicBool::new(limits.ponder),
            infinite: limits.infinite,
            start: Mutex::new(Instant::now()),
        }
    }

    /// True once the search has been stopped or aborted.
    #[inline]
    pub fn should_abort(&self) -> bool {
        self.stop.load(Ordering::Relaxed) || self.abort.load(Ordering::Relaxed)
    }

    /// External request to end the search as soon as possible.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    /// Release the helper workers once the main worker is done.
    pub fn abort(&self) {
        self.abort.store(true, Ordering::Release);
    }

    /// The opponent played the expected move: continue as a normal search.
    pub fn ponderhit(&self) {
        *self.start.lock().unwrap_or_else(PoisonError::into_inner) = Instant::now();
        self.pondering.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_pondering(&self) -> bool {
        self.pondering.load(Ordering::Acquire)
    }

    /// The best move may not be announced yet: the search is infinite or
    /// pondering and nobody has stopped it.
    pub fn must_wait(&self) -> bool {
        !self.stop.load(Ordering::Acquire) && (self.infinite || self.is_pondering())
    }

    /// Time since the search started or since `ponderhit`.
    pub fn elapsed(&self) -> Duration {
        self.start.lock().unwrap_or_else(PoisonError::into_inner).elapsed()
    }

    /// Reference to the shared stop flag.
    pub fn stop_flag(&self) -> &Arc<AtomicBool> {
        &self.stop
    }
}

impl std::fmt::Debug for SearchControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchControl")
            .field("stop", &self.stop.load(Ordering::Relaxed))
            .field("abort", &self.abort.load(Ordering::Relaxed))
            .field("pondering", &self.is_pondering())
            .field("infinite", &self.infinite)
            .finish()
    }
}
