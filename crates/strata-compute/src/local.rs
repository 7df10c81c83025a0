//! Single-rank communicator for serial runs.

use crate::backend::{CommConfig, CommError, Communicator};

/// A world containing exactly one rank.
///
/// Gathers return the local buffer and reductions are the identity, so code
/// written against [`Communicator`] runs unchanged without any transport.
#[derive(Debug, Clone)]
pub struct SelfCommunicator {
    tag: i32,
}

impl SelfCommunicator {
    /// Create a single-rank world with the default configuration.
    pub fn new() -> Self {
        Self::with_config(&CommConfig::default())
    }

    pub fn with_config(config: &CommConfig) -> Self {
        Self { tag: config.tag }
    }
}

impl Default for SelfCommunicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Communicator for SelfCommunicator {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn tag(&self) -> i32 {
        self.tag
    }

    fn all_gather(&self, local: &[f64]) -> Result<Vec<Vec<f64>>, CommError> {
        Ok(vec![local.to_vec()])
    }

    fn all_reduce_sum(&self, _buf: &mut [f64]) -> Result<(), CommError> {
        Ok(())
    }

    fn barrier(&self) -> Result<(), CommError> {
        Ok(())
    }
}
