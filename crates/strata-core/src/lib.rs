//! # Strata Core
//!
//! The numerical backbone of the Strata framework. This crate implements
//! dense linear algebra over row-partitioned data and the static SVD used as
//! the reference basis generator for reduced-order models.
//!
//! ## Architecture
//!
//! All basis generators implement the [`svd::SvdBasis`] trait. Samples are
//! vectors over a state dimension that is split across the ranks of a
//! [`strata_compute::Communicator`] world; each rank passes in only its own
//! block. The static implementation ([`svd::StaticSvd`]) gathers the blocks,
//! factorizes the full sample matrix with a dense solver and hands every rank
//! its rows of the spatial basis.
//!
//! ## Modules
//!
//! - [`linalg`]: `Matrix`, `Vector` and their distribution rules.
//! - [`svd`]: Basis generator trait, static SVD, dense solver backends.

pub mod linalg;
pub mod svd;

pub use linalg::{Distribution, LinAlgError, Matrix, Vector};
pub use svd::{BasisState, StaticSvd, SvdBasis, SvdError};
