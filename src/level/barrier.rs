use crate::common::error::Error;

use parking_lot::{Condvar, Mutex};

/// A reusable barrier that elects one thread per round to run a resize.
///
/// The participants are the currently registered workers. Every participant
/// must cross once per round. The last one to arrive runs the round while
/// holding the barrier's mutex, then wakes the others, who all receive the
/// round's outcome.
pub(crate) struct ResizeBarrier {
    state: Mutex<BarrierState>,
    complete: Condvar,
}

struct BarrierState {
    // One entry per worker id; `true` while the id is taken.
    registered: Box<[bool]>,
    participants: usize,
    crossing: usize,
    generation: u64,
    outcome: Result<(), Error>,
}

impl ResizeBarrier {
    pub(crate) fn new(max_participants: usize) -> Self {
        Self {
            state: Mutex::new(BarrierState {
                registered: vec![false; max_participants].into_boxed_slice(),
                participants: 0,
                crossing: 0,
                generation: 0,
                outcome: Ok(()),
            }),
            complete: Condvar::new(),
        }
    }

    /// Registers a new participant and returns the lowest free id.
    pub(crate) fn register(&self) -> Result<usize, Error> {
        let mut state = self.state.lock();
        let id = state
            .registered
            .iter()
            .position(|taken| !taken)
            .ok_or(Error::TooManyWorkers(state.registered.len()))?;
        state.registered[id] = true;
        state.participants += 1;
        Ok(id)
    }

    /// Removes participant `id`.
    ///
    /// If the remaining participants have all arrived at a pending round, the
    /// departing thread runs `round` on their behalf, so they are not left
    /// waiting for someone who will never come.
    pub(crate) fn deregister<F>(&self, id: usize, round: F) -> Option<Result<(), Error>>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let mut state = self.state.lock();
        debug_assert!(state.registered[id]);
        state.registered[id] = false;
        state.participants -= 1;

        if state.crossing > 0 && state.crossing >= state.participants {
            let outcome = round();
            self.finish_round(&mut state, outcome.clone());
            Some(outcome)
        } else {
            None
        }
    }

    /// Arrives at the barrier and blocks until the current round is over.
    ///
    /// Returns the outcome of `round`, whichever participant ran it.
    pub(crate) fn cross<F>(&self, round: F) -> Result<(), Error>
    where
        F: FnOnce() -> Result<(), Error>,
    {
        let mut state = self.state.lock();
        state.crossing += 1;

        if state.crossing < state.participants {
            let generation = state.generation;
            while state.generation == generation {
                self.complete.wait(&mut state);
            }
            state.outcome.clone()
        } else {
            let outcome = round();
            self.finish_round(&mut state, outcome.clone());
            outcome
        }
    }

    pub(crate) fn participants(&self) -> usize {
        self.state.lock().participants
    }

    fn finish_round(&self, state: &mut BarrierState, outcome: Result<(), Error>) {
        state.crossing = 0;
        state.generation = state.generation.wrapping_add(1);
        state.outcome = outcome;
        self.complete.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn ids_are_reused_lowest_first() {
        let barrier = ResizeBarrier::new(3);
        assert_eq!(barrier.register(), Ok(0));
        assert_eq!(barrier.register(), Ok(1));
        assert_eq!(barrier.register(), Ok(2));
        assert_eq!(barrier.register(), Err(Error::TooManyWorkers(3)));

        assert!(barrier.deregister(1, || unreachable!()).is_none());
        assert_eq!(barrier.participants(), 2);
        assert_eq!(barrier.register(), Ok(1));
    }

    #[test]
    fn single_participant_runs_every_round() {
        let barrier = ResizeBarrier::new(1);
        barrier.register().unwrap();

        let rounds = AtomicUsize::new(0);
        for _ in 0..3 {
            barrier
                .cross(|| {
                    rounds.fetch_add(1, Ordering::Relaxed);
                    Ok(())
                })
                .unwrap();
        }
        assert_eq!(rounds.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn exactly_one_thread_runs_each_round() {
        const THREADS: usize = 8;
        const ROUNDS: usize = 20;

        let barrier = ResizeBarrier::new(THREADS);
        for _ in 0..THREADS {
            barrier.register().unwrap();
        }
        let runs = AtomicUsize::new(0);

        std::thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for round in 0..ROUNDS {
                        barrier
                            .cross(|| {
                                // Every other participant is parked here.
                                assert_eq!(runs.load(Ordering::SeqCst), round);
                                runs.fetch_add(1, Ordering::SeqCst);
                                Ok(())
                            })
                            .unwrap();
                        assert_eq!(runs.load(Ordering::SeqCst), round + 1);
                    }
                });
            }
        });

        assert_eq!(runs.load(Ordering::SeqCst), ROUNDS);
    }

    #[test]
    fn failure_reaches_every_participant() {
        let barrier = ResizeBarrier::new(4);
        for _ in 0..4 {
            barrier.register().unwrap();
        }
        let failure = Error::AllocationFailure { buckets: 64 };

        std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| barrier.cross(|| Err(failure.clone()))))
                .collect();
            for h in handles {
                assert_eq!(h.join().unwrap(), Err(failure.clone()));
            }
        });
    }

    #[test]
    fn departure_completes_a_pending_round() {
        let barrier = ResizeBarrier::new(2);
        let a = barrier.register().unwrap();
        let b = barrier.register().unwrap();
        assert_ne!(a, b);

        let runs = AtomicUsize::new(0);

        std::thread::scope(|s| {
            let waiter = s.spawn(|| {
                barrier.cross(|| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
            });

            // Wait until the first participant has arrived.
            while barrier.state.lock().crossing == 0 {
                std::thread::yield_now();
            }

            let outcome = barrier.deregister(b, || {
                runs.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            assert_eq!(outcome, Some(Ok(())));
            assert_eq!(waiter.join().unwrap(), Ok(()));
        });

        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(barrier.participants(), 1);
    }
}
