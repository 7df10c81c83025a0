//! In-process multi-rank world for running SPMD code on threads.
//!
//! Each rank is a [`ThreadCommunicator`] that must live on its own OS thread
//! (use `std::thread::scope` or `std::thread::spawn`; a bounded work-stealing
//! pool can deadlock because collectives block). Collectives rendezvous on a
//! shared mutex/condvar pair:
//!
//! - **Rounds**: every collective is one round. A rank deposits its
//!   contribution, the last rank to arrive publishes the rank-ordered
//!   result and bumps the generation counter, and the waiters wake up.
//! - **Lockstep checking**: the first contribution of a round fixes its
//!   collective kind and tag. A rank arriving with a different kind or tag
//!   fails with [`CommError::Mismatch`] instead of corrupting the round.
//! - **Bounded waits**: with [`CommConfig::timeout`] set, a rank that waits
//!   longer than the timeout withdraws its contribution and fails with
//!   [`CommError::Timeout`].
//!
//! A world that has produced an error is not meant to be reused.

use std::fmt;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::backend::{sum_contributions, CollectiveKind, CommConfig, CommError, Communicator};

/// Mutable state of the current round.
#[derive(Debug)]
struct RoundState {
    generation: u64,
    /// Kind and tag of the round currently being assembled.
    pending: Option<(CollectiveKind, i32)>,
    slots: Vec<Option<Vec<f64>>>,
    arrived: usize,
    /// Result of the most recently completed round.
    result: Option<Arc<Vec<Vec<f64>>>>,
}

#[derive(Debug)]
struct Rendezvous {
    state: Mutex<RoundState>,
    cond: Condvar,
}

/// Factory for in-process worlds.
pub struct ThreadWorld;

impl ThreadWorld {
    /// Create a world of `size` ranks sharing one configuration.
    ///
    /// The returned communicators are ordered by rank.
    pub fn new(size: usize, config: &CommConfig) -> Result<Vec<ThreadCommunicator>, CommError> {
        if size == 0 {
            return Err(CommError::InvalidWorld("world size must be positive".into()));
        }

        let shared = Arc::new(Rendezvous {
            state: Mutex::new(RoundState {
                generation: 0,
                pending: None,
                slots: vec![None; size],
                arrived: 0,
                result: None,
            }),
            cond: Condvar::new(),
        });

        log::debug!(
            "Created thread world: {} ranks, tag {}, timeout {:?}",
            size,
            config.tag,
            config.timeout
        );

        Ok((0..size)
            .map(|rank| ThreadCommunicator {
                rank,
                size,
                tag: config.tag,
                timeout: config.timeout,
                shared: Arc::clone(&shared),
            })
            .collect())
    }
}

/// One rank of a [`ThreadWorld`].
pub struct ThreadCommunicator {
    rank: usize,
    size: usize,
    tag: i32,
    timeout: Option<Duration>,
    shared: Arc<Rendezvous>,
}

impl fmt::Debug for ThreadCommunicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadCommunicator")
            .field("rank", &self.rank)
            .field("size", &self.size)
            .field("tag", &self.tag)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ThreadCommunicator {
    /// Deposit `data` for the current round and wait for everyone else.
    fn exchange(
        &self,
        kind: CollectiveKind,
        data: Vec<f64>,
    ) -> Result<Arc<Vec<Vec<f64>>>, CommError> {
        let mut state = self.shared.state.lock().map_err(|_| CommError::Poisoned)?;

        let pending = state.pending;
        match pending {
            Some((expected, expected_tag)) if expected != kind || expected_tag != self.tag => {
                return Err(CommError::Mismatch {
                    rank: self.rank,
                    expected,
                    expected_tag,
                    found: kind,
                    found_tag: self.tag,
                });
            }
            Some(_) => {}
            None => state.pending = Some((kind, self.tag)),
        }

        state.slots[self.rank] = Some(data);
        state.arrived += 1;
        let generation = state.generation;

        if state.arrived == self.size {
            let gathered: Vec<Vec<f64>> = state
                .slots
                .iter_mut()
                .map(|slot| slot.take().unwrap_or_default())
                .collect();
            let gathered = Arc::new(gathered);
            state.result = Some(Arc::clone(&gathered));
            state.arrived = 0;
            state.pending = None;
            state.generation += 1;
            self.shared.cond.notify_all();
            log::trace!("rank {}: completed {} round {}", self.rank, kind, generation);
            return Ok(gathered);
        }

        let state = match self.timeout {
            None => self
                .shared
                .cond
                .wait_while(state, |s| s.generation == generation)
                .map_err(|_| CommError::Poisoned)?,
            Some(timeout) => {
                let (mut state, wait) = self
                    .shared
                    .cond
                    .wait_timeout_while(state, timeout, |s| s.generation == generation)
                    .map_err(|_| CommError::Poisoned)?;
                if wait.timed_out() {
                    state.slots[self.rank] = None;
                    state.arrived -= 1;
                    if state.arrived == 0 {
                        state.pending = None;
                    }
                    log::warn!(
                        "rank {}: {} timed out after {:?} ({} of {} ranks arrived)",
                        self.rank,
                        kind,
                        timeout,
                        state.arrived,
                        self.size
                    );
                    return Err(CommError::Timeout {
                        rank: self.rank,
                        kind,
                        timeout,
                    });
                }
                state
            }
        };

        state.result.clone().ok_or(CommError::Poisoned)
    }
}

impl Communicator for ThreadCommunicator {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.size
    }

    fn tag(&self) -> i32 {
        self.tag
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, CommError> {
        let gathered = self.exchange(CollectiveKind::AllGather, local.to_vec())?;
        Ok(gathered.as_ref().clone())
    }

    fn all_reduce_sum(&self, buf: &mut [f64]) -> Result<(), CommError> {
        let gathered = self.exchange(CollectiveKind::AllReduceSum, buf.to_vec())?;
        let total = sum_contributions(&gathered, buf.len())?;
        buf.copy_from_slice(&total);
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        self.exchange(CollectiveKind::Barrier, Vec::new())?;
        Ok(())
    }
}
