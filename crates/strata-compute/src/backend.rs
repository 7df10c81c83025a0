//! Communicator trait and collective-operation configuration.
//!
//! The [`Communicator`] trait abstracts over the process world a distributed
//! matrix or basis generator lives in, so that the linear algebra in
//! `strata-core` never talks to a transport directly. Every method is a
//! *collective*: all ranks must call the same operations in the same order,
//! otherwise the world blocks (or, for backends that can detect it, fails
//! with [`CommError::Mismatch`]).

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Tag used when no explicit tag is configured.
pub const DEFAULT_TAG: i32 = 1;

/// Errors originating from collective operations.
#[derive(Debug, Error)]
pub enum CommError {
    #[error(
        "Collective mismatch on rank {rank}: expected {expected} (tag {expected_tag}), \
         got {found} (tag {found_tag})"
    )]
    Mismatch {
        rank: usize,
        expected: CollectiveKind,
        expected_tag: i32,
        found: CollectiveKind,
        found_tag: i32,
    },

    #[error("Rank {rank} timed out after {timeout:?} waiting in {kind}")]
    Timeout {
        rank: usize,
        kind: CollectiveKind,
        timeout: Duration,
    },

    #[error("Reduction length mismatch: rank {rank} contributed {found}, expected {expected}")]
    LengthMismatch {
        rank: usize,
        expected: usize,
        found: usize,
    },

    #[error("Communicator state poisoned by a panicking rank")]
    Poisoned,

    #[error("Invalid world: {0}")]
    InvalidWorld(String),
}

/// The collective operations a [`Communicator`] provides.
///
/// Carried alongside every contribution so that backends can detect ranks
/// that fell out of lockstep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectiveKind {
    AllGather,
    AllReduceSum,
    Barrier,
}

impl fmt::Display for CollectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CollectiveKind::AllGather => "all_gather",
            CollectiveKind::AllReduceSum => "all_reduce_sum",
            CollectiveKind::Barrier => "barrier",
        };
        f.write_str(name)
    }
}

/// Configuration shared by every rank of a world.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CommConfig {
    /// Message tag stamped on every contribution.
    pub tag: i32,
    /// Upper bound on how long a rank waits inside a collective. `None`
    /// blocks indefinitely.
    #[serde(rename = "timeout_ms", with = "timeout_millis")]
    pub timeout: Option<Duration>,
}

impl Default for CommConfig {
    fn default() -> Self {
        Self {
            tag: DEFAULT_TAG,
            timeout: None,
        }
    }
}

impl CommConfig {
    pub fn with_tag(tag: i32) -> Self {
        Self {
            tag,
            ..Default::default()
        }
    }

    /// Bound every collective wait by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

mod timeout_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Option::<u64>::deserialize(deserializer)?;
        Ok(millis.map(Duration::from_millis))
    }
}

/// The type of communicator backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommKind {
    /// A single rank; collectives are local no-ops.
    #[default]
    Local,
    /// Several ranks inside one process, one OS thread each.
    Threads,
}

/// A member of a process world.
///
/// Implementations must be shareable across threads: distributed matrices
/// hold an `Arc<dyn Communicator>` and may be moved to the thread that owns
/// the rank.
pub trait Communicator: Send + Sync + fmt::Debug {
    /// Rank of this member, in `0..size()`.
    fn rank(&self) -> usize;

    /// Number of ranks in the world.
    fn size(&self) -> usize;

    /// Tag stamped on this member's contributions.
    fn tag(&self) -> i32;

    /// Gather every rank's buffer onto every rank.
    ///
    /// Buffers may differ in length between ranks. The result is indexed by
    /// rank, so concatenating it yields rank-ordered data.
    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, CommError>;

    /// Element-wise sum of `buf` across all ranks, written back in place.
    ///
    /// Every rank must contribute a buffer of the same length.
    fn all_reduce_sum(&self, buf: &mut [f64]) -> Result<(), CommError>;

    /// Block until every rank has reached the barrier.
    fn barrier(&self) -> Result<(), CommError>;

    /// Whether this world has more than one rank.
    fn is_parallel(&self) -> bool {
        self.size() > 1
    }
}

/// Sum per-rank contributions element-wise.
///
/// Shared by backends that implement the reduction as gather-then-sum.
pub(crate) fn sum_contributions(
    contributions: &[Vec<f64>],
    expected_len: usize,
) -> Result<Vec<f64>, CommError> {
    let mut total = vec![0.0; expected_len];
    for (rank, part) in contributions.iter().enumerate() {
        if part.len() != expected_len {
            return Err(CommError::LengthMismatch {
                rank,
                expected: expected_len,
                found: part.len(),
            });
        }
        for (acc, value) in total.iter_mut().zip(part) {
            *acc += value;
        }
    }
    Ok(total)
}
