//! Reusable phase barrier
//!
//! Blocks a fixed number of participants until the last one arrives, then releases
//! all of them and resets for the next round. A generation counter separates rounds,
//! so a fast thread re-entering [`CyclicBarrier::wait`] cannot be counted toward the
//! round it just left, and spurious condvar wake-ups are absorbed.

use parking_lot::{Condvar, Mutex};

#[derive(Debug)]
struct BarrierState {
    /// Threads arrived in the current round
    count: usize,
    /// Completed rounds
    generation: u64,
}

/// Cyclic barrier for a fixed participant count
#[derive(Debug)]
pub struct CyclicBarrier {
    state: Mutex<BarrierState>,
    cvar: Condvar,
    trip_count: usize,
}

impl CyclicBarrier {
    /// Create a barrier released by every `trip_count`-th arrival
    ///
    /// # Panics
    /// Panics if `trip_count` is zero.
    pub fn new(trip_count: usize) -> Self {
        assert!(trip_count > 0, "barrier needs at least one participant");
        Self {
            state: Mutex::new(BarrierState {
                count: 0,
                generation: 0,
            }),
            cvar: Condvar::new(),
            trip_count,
        }
    }

    /// Number of participants per round
    pub fn trip_count(&self) -> usize {
        self.trip_count
    }

    /// Block until `trip_count` threads have called `wait` in this round.
    ///
    /// Returns `true` for exactly one caller per round (the last to arrive).
    pub fn wait(&self) -> bool {
        let mut state = self.state.lock();
        let generation = state.generation;
        state.count += 1;

        if state.count == self.trip_count {
            state.count = 0;
            state.generation = state.generation.wrapping_add(1);
            self.cvar.notify_all();
            true
        } else {
            while state.generation == generation {
                self.cvar.wait(&mut state);
            }
            false
        }
    }
}
