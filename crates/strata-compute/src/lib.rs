//! # Strata Compute
//!
//! Collective communication boundary for the Strata framework. This crate
//! provides a [`Communicator`](backend::Communicator) trait that isolates the
//! distributed linear algebra from the transport that connects the ranks.
//!
//! ## Available backends
//!
//! | Backend | Feature flag | Ranks |
//! |---------|-------------|-------|
//! | Self (serial) | always | 1 |
//! | Thread world | `threads` (default) | N, one OS thread each |
//!
//! Every rank of a world must issue the same collectives in the same order.
//! Backends that can detect a violation report it as
//! [`CommError::Mismatch`]; otherwise the world blocks until a configured
//! timeout expires.

pub mod backend;
pub mod local;

#[cfg(feature = "threads")]
pub mod distributed;

pub use backend::{CollectiveKind, CommConfig, CommError, CommKind, Communicator, DEFAULT_TAG};
pub use local::SelfCommunicator;

#[cfg(feature = "threads")]
pub use distributed::{ThreadCommunicator, ThreadWorld};
