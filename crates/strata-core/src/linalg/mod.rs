//! Dense linear algebra over row-partitioned data.
//!
//! A [`Matrix`] or [`Vector`] is either *undistributed* (every rank holds the
//! whole object) or *distributed* (each rank holds a contiguous block of
//! rows, and the global object is the rank-ordered concatenation of the
//! blocks). The [`Distribution`] carries the communicator used by the few
//! operations that must combine partial results across ranks.

pub mod matrix;
pub mod vector;

use std::sync::Arc;

use strata_compute::{CommError, Communicator};
use thiserror::Error;

pub use matrix::Matrix;
pub use vector::Vector;

/// Errors from matrix and vector operations.
///
/// Every variant except [`LinAlgError::Communication`] is a contract
/// violation: the caller combined operands that the operation does not
/// support.
#[derive(Debug, Error)]
pub enum LinAlgError {
    #[error("Dimension mismatch in {op}: {detail}")]
    DimensionMismatch { op: &'static str, detail: String },

    #[error("Distribution mismatch in {op}: {detail}")]
    DistributionMismatch { op: &'static str, detail: String },

    #[error("Empty dimension: {0}")]
    EmptyDimension(String),

    #[error("Cannot normalise a zero vector")]
    ZeroNorm,

    #[error("Communication error: {0}")]
    Communication(#[from] CommError),
}

/// How the rows of a matrix or vector are laid out across ranks.
#[derive(Debug, Clone)]
pub enum Distribution {
    /// Every rank holds the complete object.
    Undistributed,
    /// Each rank holds its own block of rows.
    Distributed(Arc<dyn Communicator>),
}

impl Distribution {
    /// Row-partition over the world `comm` belongs to.
    pub fn over(comm: Arc<dyn Communicator>) -> Self {
        Distribution::Distributed(comm)
    }

    pub fn is_distributed(&self) -> bool {
        matches!(self, Distribution::Distributed(_))
    }

    /// The communicator of a distributed layout.
    pub fn communicator(&self) -> Option<&Arc<dyn Communicator>> {
        match self {
            Distribution::Undistributed => None,
            Distribution::Distributed(comm) => Some(comm),
        }
    }
}

/// Sum `values` across ranks in place when `distribution` is distributed.
pub(crate) fn reduce_sum<'a, I>(distribution: &Distribution, values: I) -> Result<(), LinAlgError>
where
    I: IntoIterator<Item = &'a mut f64>,
{
    let Some(comm) = distribution.communicator() else {
        return Ok(());
    };

    let mut slots: Vec<&mut f64> = values.into_iter().collect();
    let mut buf: Vec<f64> = slots.iter().map(|v| **v).collect();
    comm.all_reduce_sum(&mut buf)?;
    for (slot, total) in slots.iter_mut().zip(buf) {
        **slot = total;
    }
    Ok(())
}
