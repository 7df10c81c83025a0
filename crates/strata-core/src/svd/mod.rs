//! Basis generation by singular value decomposition.
//!
//! The [`SvdBasis`] trait defines the interface every basis generator
//! implements: samples go in one at a time, and the spatial basis, temporal
//! basis and singular values of the samples collected so far come out.
//! [`static_svd::StaticSvd`] is the reference implementation; it recomputes a
//! full dense SVD of every sample and is meant as a correctness check for
//! scalable approximations.

pub mod dense;
pub mod fold;
pub mod static_svd;

use strata_compute::CommError;
use thiserror::Error;

use crate::linalg::{LinAlgError, Matrix};

pub use dense::{DenseSvd, FaerSvd, NalgebraSvd, SolverError, SolverKind, ThinSvd};
pub use static_svd::StaticSvd;

/// Errors from basis generation.
#[derive(Debug, Error)]
pub enum SvdError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No samples have been taken in the current time interval")]
    NoSamples,

    /// Ranks reached a collective factorization holding different numbers
    /// of samples. `counts` is indexed by rank.
    #[error("Rank {rank}: ranks disagree on the sample count {counts:?}")]
    SampleCountMismatch { rank: usize, counts: Vec<usize> },

    #[error("Linear algebra error: {0}")]
    LinAlg(#[from] LinAlgError),

    #[error("Dense SVD failed: {0}")]
    Solver(#[from] SolverError),
}

impl From<CommError> for SvdError {
    fn from(err: CommError) -> Self {
        SvdError::LinAlg(LinAlgError::Communication(err))
    }
}

/// Whether the cached factorization reflects every accepted sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisState {
    /// Samples changed since the last factorization (or none exists yet).
    Stale,
    /// The cached factorization is up to date.
    Current,
}

/// The core trait that all basis generators implement.
///
/// Accessors take `&mut self` because they may have to (re)compute the
/// factorization. The returned borrows keep the generator immutably borrowed,
/// so a basis cannot outlive the next accepted sample.
pub trait SvdBasis {
    /// Collect a new sample taken at simulation time `time`.
    ///
    /// Returns `Ok(false)` when the current time interval is full.
    fn take_sample(
        &mut self,
        u_in: &[f64],
        time: f64,
        add_without_increase: bool,
    ) -> Result<bool, SvdError>;

    /// Left singular vectors, distributed like the samples.
    fn spatial_basis(&mut self) -> Result<&Matrix, SvdError>;

    /// Right singular vectors (transposed), replicated on every rank.
    fn temporal_basis(&mut self) -> Result<&Matrix, SvdError>;

    /// Singular values as a replicated diagonal matrix.
    fn singular_values(&mut self) -> Result<&Matrix, SvdError>;

    /// Whether the cached factorization is up to date.
    fn is_basis_current(&self) -> bool;

    /// Human-readable name of the algorithm.
    fn method_name(&self) -> &str;
}
