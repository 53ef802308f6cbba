//! Reusable N-party rendezvous with cancellation.
//!
//! The barrier state is an explicit object behind a mutex: an arrival
//! counter, a generation token, and a sticky cancelled flag. A wait
//! call blocks until exactly `parties` calls have arrived in the same
//! generation, then all are released atomically and a new generation
//! begins. A late caller from a stale generation never blocks the new
//! one — release is detected by the generation token advancing, not by
//! the arrival counter.

use std::error::Error;
use std::fmt;
use std::sync::{Condvar, Mutex};

/// Mutable rendezvous state. Held only while arriving or being woken.
struct BarrierState {
    /// Arrivals in the current generation.
    arrived: usize,
    /// Generation token; advances on every release.
    generation: u64,
    /// Sticky: once set, all current and future waits fail.
    cancelled: bool,
}

/// A reusable rendezvous for a fixed set of parties, with cancellation.
///
/// Each of the `parties` participants must call [`wait()`](Self::wait)
/// exactly once per generation. The `parties`-th arrival releases all
/// waiters (including itself) and starts the next generation.
///
/// Unlike `std::sync::Barrier`, a participant that cannot continue may
/// call [`cancel()`](Self::cancel): every blocked waiter wakes with
/// [`BarrierCancelled`], and every later wait fails the same way. This
/// converts the "missing party" failure mode from a permanent hang into
/// a propagated error.
pub struct Barrier {
    parties: usize,
    state: Mutex<BarrierState>,
    cvar: Condvar,
}

// Compile-time assertion: Barrier must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<Barrier>();
};

/// Returned by [`Barrier::wait`] on a successful rendezvous.
///
/// Exactly one party per generation is the leader: the arrival that
/// completed the rendezvous and released the others.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierWaitResult(bool);

impl BarrierWaitResult {
    /// Whether this party's arrival released the current generation.
    pub fn is_leader(&self) -> bool {
        self.0
    }
}

/// The barrier was cancelled while (or before) waiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BarrierCancelled;

impl fmt::Display for BarrierCancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "barrier cancelled")
    }
}

impl Error for BarrierCancelled {}

impl Barrier {
    /// Create a barrier for `parties` participants.
    ///
    /// # Panics
    ///
    /// Panics if `parties` is zero: a rendezvous with no participants
    /// has no releasing arrival.
    pub fn new(parties: usize) -> Self {
        assert!(parties > 0, "barrier requires at least one party");
        Self {
            parties,
            state: Mutex::new(BarrierState {
                arrived: 0,
                generation: 0,
                cancelled: false,
            }),
            cvar: Condvar::new(),
        }
    }

    /// The fixed number of participants per generation.
    pub fn parties(&self) -> usize {
        self.parties
    }

    /// Block until all parties have arrived in this generation.
    ///
    /// The `parties`-th arrival releases everyone and reports itself as
    /// the leader. If the barrier is cancelled before this generation
    /// releases, returns [`BarrierCancelled`] instead; a waiter whose
    /// generation already released observes the release, not the
    /// cancellation.
    pub fn wait(&self) -> Result<BarrierWaitResult, BarrierCancelled> {
        let mut state = self.state.lock().unwrap();
        if state.cancelled {
            return Err(BarrierCancelled);
        }

        state.arrived += 1;
        if state.arrived == self.parties {
            // Last arrival: release this generation and start the next.
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            return Ok(BarrierWaitResult(true));
        }

        let generation = state.generation;
        while state.generation == generation && !state.cancelled {
            state = self.cvar.wait(state).unwrap();
        }
        if state.generation == generation {
            // Still our generation, so the wake came from cancel().
            Err(BarrierCancelled)
        } else {
            Ok(BarrierWaitResult(false))
        }
    }

    /// Cancel the barrier, waking every blocked waiter with an error.
    ///
    /// Sticky: every subsequent [`wait()`](Self::wait) also fails.
    /// Safe to call from any thread, any number of times.
    pub fn cancel(&self) {
        let mut state = self.state.lock().unwrap();
        state.cancelled = true;
        self.cvar.notify_all();
    }

    /// Whether [`cancel()`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        self.state.lock().unwrap().cancelled
    }
}

impl fmt::Debug for Barrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock().unwrap();
        f.debug_struct("Barrier")
            .field("parties", &self.parties)
            .field("arrived", &state.arrived)
            .field("generation", &state.generation)
            .field("cancelled", &state.cancelled)
            .finish()
    }
}
