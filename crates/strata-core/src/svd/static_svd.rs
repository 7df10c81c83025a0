//! Static (non-incremental) SVD of all samples in a time interval.
//!
//! Every rank owns a contiguous block of the state dimension. Samples are
//! buffered locally; when a basis is requested the blocks are all-gathered
//! into one `total_dim x num_samples` matrix (rows in rank order), every
//! rank computes the same dense SVD, and each keeps only its own rows of
//! `U`. Singular values and `Vᵗ` are replicated.
//!
//! This does not scale: the full sample matrix is assembled on every rank.
//! It exists as a reference against which incremental algorithms are
//! checked.
//!
//! # Collective calls
//!
//! [`StaticSvd::new`], [`StaticSvd::compute_basis`], the basis accessors
//! (when the basis is stale) and `take_sample` with `add_without_increase`
//! are collective. All ranks must make the same sequence of these calls.

use std::sync::Arc;

use ndarray::{s, Array1};
use strata_compute::Communicator;

use super::dense::{DenseSvd, FaerSvd};
use super::{fold, BasisState, SvdBasis, SvdError};
use crate::linalg::{Distribution, Matrix, Vector};

/// Cached result of the last successful factorization.
struct Factorization {
    /// This rank's rows of `U`, `dim x k`, distributed.
    spatial: Matrix,
    /// `Vᵗ`, `k x num_samples`, replicated.
    temporal: Matrix,
    /// `Σ` as a `k x k` diagonal, replicated.
    singular_values: Matrix,
}

/// Basis generator that recomputes a full SVD of every sample.
///
/// Samples are copied on [`StaticSvd::take_sample`], so callers may reuse
/// their buffers immediately.
pub struct StaticSvd {
    dim: usize,
    total_dim: usize,
    row_offset: usize,
    samples_per_time_interval: usize,
    debug_algorithm: bool,
    comm: Arc<dyn Communicator>,
    rank: usize,
    num_procs: usize,
    solver: Box<dyn DenseSvd>,
    /// One entry per retained sample, each of length `dim`.
    samples: Vec<Array1<f64>>,
    sample_times: Vec<f64>,
    factorization: Option<Factorization>,
    state: BasisState,
}

impl StaticSvd {
    /// Create a generator using the default (`faer`) dense solver.
    ///
    /// `dim` is the part of the state dimension owned by this rank. This is
    /// a collective call: the ranks exchange their `dim` to establish the
    /// global dimension and this rank's row offset.
    pub fn new(
        dim: usize,
        samples_per_time_interval: usize,
        debug_algorithm: bool,
        comm: Arc<dyn Communicator>,
    ) -> Result<Self, SvdError> {
        Self::with_solver(
            dim,
            samples_per_time_interval,
            debug_algorithm,
            comm,
            Box::new(FaerSvd),
        )
    }

    /// Create a generator with an explicit dense solver.
    pub fn with_solver(
        dim: usize,
        samples_per_time_interval: usize,
        debug_algorithm: bool,
        comm: Arc<dyn Communicator>,
        solver: Box<dyn DenseSvd>,
    ) -> Result<Self, SvdError> {
        if dim == 0 {
            return Err(SvdError::InvalidArgument("dim must be positive".into()));
        }
        if samples_per_time_interval == 0 {
            return Err(SvdError::InvalidArgument(
                "samples_per_time_interval must be positive".into(),
            ));
        }

        let rank = comm.rank();
        let num_procs = comm.size();

        let dims: Vec<usize> = comm
            .all_gather(&[dim as f64])?
            .iter()
            .map(|block| block.first().copied().unwrap_or(0.0) as usize)
            .collect();
        let total_dim: usize = dims.iter().sum();
        let row_offset: usize = dims.iter().take(rank).sum();

        log::debug!(
            "rank {}/{}: static SVD with dim {} (rows {}..{} of {}), {} samples per interval, solver {}",
            rank,
            num_procs,
            dim,
            row_offset,
            row_offset + dim,
            total_dim,
            samples_per_time_interval,
            solver.name()
        );

        Ok(Self {
            dim,
            total_dim,
            row_offset,
            samples_per_time_interval,
            debug_algorithm,
            comm,
            rank,
            num_procs,
            solver,
            samples: Vec::with_capacity(samples_per_time_interval),
            sample_times: Vec::with_capacity(samples_per_time_interval),
            factorization: None,
            state: BasisState::Stale,
        })
    }

    /// Collect the sample `u_in` taken at simulation time `time`.
    ///
    /// Returns `Ok(false)`, leaving all state untouched, when the interval
    /// already holds `samples_per_time_interval` samples. With
    /// `add_without_increase` the sample is folded into the existing
    /// factorization without adding a column (see [`super::fold`]); this is
    /// collective and is allowed on a full interval.
    pub fn take_sample(
        &mut self,
        u_in: &[f64],
        time: f64,
        add_without_increase: bool,
    ) -> Result<bool, SvdError> {
        if u_in.len() != self.dim {
            return Err(SvdError::InvalidArgument(format!(
                "sample has {} entries, expected {}",
                u_in.len(),
                self.dim
            )));
        }
        if !(time >= 0.0 && time.is_finite()) {
            return Err(SvdError::InvalidArgument(format!(
                "sample time must be finite and non-negative, got {}",
                time
            )));
        }

        if add_without_increase && !self.samples.is_empty() {
            self.add_linearly_dependent(u_in)?;
            return Ok(true);
        }

        if self.samples.len() >= self.samples_per_time_interval {
            log::debug!(
                "rank {}: time interval full ({} samples), rejecting sample at t={}",
                self.rank,
                self.samples.len(),
                time
            );
            return Ok(false);
        }

        self.samples.push(Array1::from_vec(u_in.to_vec()));
        self.sample_times.push(time);
        self.state = BasisState::Stale;
        Ok(true)
    }

    /// Gather all samples and factorize them.
    ///
    /// Collective. Accessors call this automatically when the basis is stale.
    pub fn compute_basis(&mut self) -> Result<(), SvdError> {
        let num_samples = self.samples.len();

        // Sample count, then the local block row-major (dim x num_samples).
        let mut local = Vec::with_capacity(1 + self.dim * num_samples);
        local.push(num_samples as f64);
        for row in 0..self.dim {
            local.extend(self.samples.iter().map(|sample| sample[row]));
        }

        let gathered = self.comm.all_gather(&local)?;
        let counts: Vec<usize> = gathered
            .iter()
            .map(|block| block.first().copied().unwrap_or(0.0) as usize)
            .collect();
        if counts.iter().any(|&count| count != num_samples) {
            log::warn!(
                "rank {}: ranks disagree on the sample count: {:?}",
                self.rank,
                counts
            );
            return Err(SvdError::SampleCountMismatch {
                rank: self.rank,
                counts,
            });
        }

        if num_samples == 0 {
            return Err(SvdError::NoSamples);
        }

        let mut global = Vec::with_capacity(self.total_dim * num_samples);
        for block in &gathered {
            global.extend_from_slice(block.get(1..).unwrap_or(&[]));
        }

        let a = Matrix::from_row_major(
            &global,
            self.total_dim,
            num_samples,
            Distribution::Undistributed,
        )?;
        self.svd(&a, self.total_dim)
    }

    /// Factorize the globalized sample matrix `a` and keep this rank's rows
    /// of `U`.
    fn svd(&mut self, a: &Matrix, total_dim: usize) -> Result<(), SvdError> {
        if total_dim == 0 || a.num_rows() != total_dim {
            return Err(SvdError::InvalidArgument(format!(
                "globalized matrix has {} rows, expected total_dim {}",
                a.num_rows(),
                total_dim
            )));
        }

        if self.debug_algorithm {
            log::debug!(
                "rank {}: globalized sample matrix ({}x{}):\n{:.6}",
                self.rank,
                a.num_rows(),
                a.num_columns(),
                a.as_array()
            );
        }

        let result = self.solver.thin_svd(a.as_array()).map_err(|e| {
            log::warn!("rank {}: {} SVD failed: {}", self.rank, self.solver.name(), e);
            e
        })?;
        let k = result.rank_bound();

        let block = result
            .u
            .slice(s![self.row_offset..self.row_offset + self.dim, ..])
            .to_owned();
        let spatial = Matrix::from_array(block, Distribution::over(Arc::clone(&self.comm)))?;
        let singular_values = Matrix::diagonal(&result.singular_values.to_vec())?;
        let temporal = Matrix::from_array(result.vt, Distribution::Undistributed)?;

        if self.debug_algorithm {
            log::debug!(
                "rank {}: spatial basis rows {}..{}:\n{:.6}",
                self.rank,
                self.row_offset,
                self.row_offset + self.dim,
                spatial.as_array()
            );
            log::debug!(
                "rank {}: singular values: {:.6}",
                self.rank,
                result.singular_values
            );
            log::debug!(
                "rank {}: temporal basis:\n{:.6}",
                self.rank,
                temporal.as_array()
            );
        }

        log::debug!(
            "rank {}: factorized {} samples (total_dim {}, k {})",
            self.rank,
            a.num_columns(),
            total_dim,
            k
        );

        self.factorization = Some(Factorization {
            spatial,
            temporal,
            singular_values,
        });
        self.state = BasisState::Current;
        Ok(())
    }

    /// Replace the retained samples `A` by `A'` with the same column count
    /// and `A' A'ᵗ = A Aᵗ + P s sᵗ P`, `P` projecting onto the spatial basis.
    fn add_linearly_dependent(&mut self, u_in: &[f64]) -> Result<(), SvdError> {
        self.ensure_current()?;

        let folded = {
            let fact = self.current_factorization()?;
            let sample = Vector::from_slice(u_in, Distribution::over(Arc::clone(&self.comm)))?;
            let coefficients = fact.spatial.transpose_mult_vector(&sample)?;

            let k = fact.singular_values.num_rows();
            let sigma: Vec<f64> = (0..k).map(|i| fact.singular_values.item(i, i)).collect();
            let root = Matrix::from_array(
                fold::folded_factor(&sigma, &coefficients.to_vec()),
                Distribution::Undistributed,
            )?;

            let mixing = root.mult(&fact.temporal)?;
            fact.spatial.mult(&mixing)?
        };

        self.samples = (0..folded.num_columns())
            .map(|j| folded.column(j).into_array())
            .collect();
        self.state = BasisState::Stale;

        log::debug!(
            "rank {}: folded a linearly dependent sample into {} retained samples",
            self.rank,
            self.samples.len()
        );
        Ok(())
    }

    fn ensure_current(&mut self) -> Result<(), SvdError> {
        if self.state == BasisState::Stale {
            self.compute_basis()?;
        }
        Ok(())
    }

    fn current_factorization(&self) -> Result<&Factorization, SvdError> {
        self.factorization.as_ref().ok_or(SvdError::NoSamples)
    }

    /// Left singular vectors for this rank's rows, `dim x k`, distributed.
    pub fn spatial_basis(&mut self) -> Result<&Matrix, SvdError> {
        self.ensure_current()?;
        Ok(&self.current_factorization()?.spatial)
    }

    /// Right singular vectors, transposed: `k x num_samples`, replicated.
    pub fn temporal_basis(&mut self) -> Result<&Matrix, SvdError> {
        self.ensure_current()?;
        Ok(&self.current_factorization()?.temporal)
    }

    /// Singular values as a `k x k` diagonal matrix, replicated.
    pub fn singular_values(&mut self) -> Result<&Matrix, SvdError> {
        self.ensure_current()?;
        Ok(&self.current_factorization()?.singular_values)
    }

    /// Discard all samples and the cached basis to begin a new interval.
    pub fn start_new_interval(&mut self) {
        self.samples.clear();
        self.sample_times.clear();
        self.factorization = None;
        self.state = BasisState::Stale;
    }

    pub fn is_basis_current(&self) -> bool {
        self.state == BasisState::Current
    }

    pub fn state(&self) -> BasisState {
        self.state
    }

    /// State dimension owned by this rank.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Global state dimension, summed over all ranks.
    pub fn total_dim(&self) -> usize {
        self.total_dim
    }

    /// First global row owned by this rank.
    pub fn row_offset(&self) -> usize {
        self.row_offset
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn samples_per_time_interval(&self) -> usize {
        self.samples_per_time_interval
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn num_procs(&self) -> usize {
        self.num_procs
    }

    /// Simulation time of the first sample of the current interval.
    pub fn interval_start_time(&self) -> Option<f64> {
        self.sample_times.first().copied()
    }

    pub fn sample_times(&self) -> &[f64] {
        &self.sample_times
    }
}

impl SvdBasis for StaticSvd {
    fn take_sample(
        &mut self,
        u_in: &[f64],
        time: f64,
        add_without_increase: bool,
    ) -> Result<bool, SvdError> {
        StaticSvd::take_sample(self, u_in, time, add_without_increase)
    }

    fn spatial_basis(&mut self) -> Result<&Matrix, SvdError> {
        StaticSvd::spatial_basis(self)
    }

    fn temporal_basis(&mut self) -> Result<&Matrix, SvdError> {
        StaticSvd::temporal_basis(self)
    }

    fn singular_values(&mut self) -> Result<&Matrix, SvdError> {
        StaticSvd::singular_values(self)
    }

    fn is_basis_current(&self) -> bool {
        StaticSvd::is_basis_current(self)
    }

    fn method_name(&self) -> &str {
        "Static SVD"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svd::dense::{NalgebraSvd, SolverError, ThinSvd};
    use approx::assert_abs_diff_eq;
    use ndarray::Array2;
    use strata_compute::SelfCommunicator;

    fn serial(dim: usize, capacity: usize) -> StaticSvd {
        StaticSvd::new(dim, capacity, false, Arc::new(SelfCommunicator::new())).unwrap()
    }

    /// Solver that always fails, for exercising the error path.
    struct FailingSvd;

    impl DenseSvd for FailingSvd {
        fn name(&self) -> &str {
            "failing"
        }

        fn thin_svd(&self, _a: &Array2<f64>) -> Result<ThinSvd, SolverError> {
            Err(SolverError::NoConvergence { max_iterations: 0 })
        }
    }

    #[test]
    fn test_invalid_construction() {
        let comm: Arc<dyn Communicator> = Arc::new(SelfCommunicator::new());
        assert!(matches!(
            StaticSvd::new(0, 2, false, Arc::clone(&comm)),
            Err(SvdError::InvalidArgument(_))
        ));
        assert!(matches!(
            StaticSvd::new(3, 0, false, comm),
            Err(SvdError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_invalid_samples_rejected() {
        let mut svd = serial(3, 2);
        assert!(matches!(
            svd.take_sample(&[1.0, 2.0], 0.0, false),
            Err(SvdError::InvalidArgument(_))
        ));
        assert!(matches!(
            svd.take_sample(&[1.0, 2.0, 3.0], -1.0, false),
            Err(SvdError::InvalidArgument(_))
        ));
        assert!(matches!(
            svd.take_sample(&[1.0, 2.0, 3.0], f64::NAN, false),
            Err(SvdError::InvalidArgument(_))
        ));
        assert_eq!(svd.num_samples(), 0);
    }

    #[test]
    fn test_serial_layout() {
        let svd = serial(5, 3);
        assert_eq!(svd.dim(), 5);
        assert_eq!(svd.total_dim(), 5);
        assert_eq!(svd.row_offset(), 0);
        assert_eq!(svd.rank(), 0);
        assert_eq!(svd.num_procs(), 1);
        assert_eq!(svd.state(), BasisState::Stale);
    }

    #[test]
    fn test_two_unit_samples() {
        let mut svd = serial(3, 2);
        assert!(svd.take_sample(&[1.0, 0.0, 0.0], 0.0, false).unwrap());
        assert!(svd.take_sample(&[0.0, 1.0, 0.0], 1.0, false).unwrap());

        let sigma = svd.singular_values().unwrap().clone();
        assert_eq!((sigma.num_rows(), sigma.num_columns()), (2, 2));
        assert_abs_diff_eq!(sigma.item(0, 0), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sigma.item(1, 1), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sigma.item(0, 1), 0.0);

        // Columns of U are ±e1, ±e2 in some order.
        let u = svd.spatial_basis().unwrap().clone();
        assert!(u.distributed());
        assert_eq!((u.num_rows(), u.num_columns()), (3, 2));
        let mut hits = Vec::new();
        for j in 0..2 {
            let col: Vec<f64> = (0..3).map(|i| u.item(i, j).abs()).collect();
            let i = col
                .iter()
                .position(|&x| (x - 1.0).abs() < 1e-12)
                .expect("column is a signed unit vector");
            assert!(col.iter().enumerate().all(|(r, &x)| r == i || x < 1e-12));
            hits.push(i);
        }
        hits.sort_unstable();
        assert_eq!(hits, vec![0, 1]);

        // Vᵗ is a signed permutation of the 2x2 identity.
        let vt = svd.temporal_basis().unwrap();
        assert!(!vt.distributed());
        assert_eq!((vt.num_rows(), vt.num_columns()), (2, 2));
        for i in 0..2 {
            let row_max = (0..2).map(|j| vt.item(i, j).abs()).fold(0.0, f64::max);
            assert_abs_diff_eq!(row_max, 1.0, epsilon = 1e-12);
        }
        assert!(svd.is_basis_current());
        assert_eq!(svd.interval_start_time(), Some(0.0));
        assert_eq!(svd.sample_times(), &[0.0, 1.0]);
    }

    #[test]
    fn test_capacity_rejects_without_state_change() {
        let mut svd = serial(2, 2);
        assert!(svd.take_sample(&[1.0, 2.0], 0.0, false).unwrap());
        assert!(svd.take_sample(&[3.0, 4.0], 0.5, false).unwrap());
        svd.compute_basis().unwrap();
        assert!(svd.is_basis_current());

        assert!(!svd.take_sample(&[5.0, 6.0], 1.0, false).unwrap());
        assert_eq!(svd.num_samples(), 2);
        assert!(svd.is_basis_current());
        assert_eq!(svd.sample_times(), &[0.0, 0.5]);
    }

    #[test]
    fn test_new_sample_makes_basis_stale() {
        let mut svd = serial(3, 3);
        svd.take_sample(&[1.0, 0.0, 0.0], 0.0, false).unwrap();
        assert_eq!(svd.singular_values().unwrap().num_rows(), 1);
        assert!(svd.is_basis_current());

        svd.take_sample(&[0.0, 2.0, 0.0], 1.0, false).unwrap();
        assert!(!svd.is_basis_current());

        let sigma = svd.singular_values().unwrap();
        assert_eq!(sigma.num_rows(), 2);
        assert_abs_diff_eq!(sigma.item(0, 0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(sigma.item(1, 1), 1.0, epsilon = 1e-12);
        assert!(svd.is_basis_current());
    }

    #[test]
    fn test_reconstruction_and_orthonormality() {
        let samples = [
            [1.0, 2.0, 0.0, -1.0, 0.5, 3.0],
            [0.0, 1.0, 1.0, 2.0, -0.5, 1.0],
            [2.0, -1.0, 3.0, 0.0, 1.0, 0.0],
            [1.5, 0.5, -2.0, 1.0, 0.0, 2.5],
        ];
        let mut svd = serial(6, 4);
        for (t, sample) in samples.iter().enumerate() {
            assert!(svd.take_sample(sample, t as f64, false).unwrap());
        }

        let u = svd.spatial_basis().unwrap().clone();
        let sigma = svd.singular_values().unwrap().clone();
        let vt = svd.temporal_basis().unwrap().clone();

        let us = u.as_array().dot(sigma.as_array());
        let a = us.dot(vt.as_array());
        let scale = a.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
        for (j, sample) in samples.iter().enumerate() {
            for i in 0..6 {
                assert!((a[[i, j]] - sample[i]).abs() <= 1e-10 * scale);
            }
        }

        let utu = u.transpose_mult(&u).unwrap();
        let vvt = vt.as_array().dot(&vt.as_array().t());
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_abs_diff_eq!(utu.item(i, j), expected, epsilon = 1e-10);
                assert_abs_diff_eq!(vvt[[i, j]], expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_more_samples_than_rows() {
        let mut svd = serial(2, 3);
        svd.take_sample(&[1.0, 0.0], 0.0, false).unwrap();
        svd.take_sample(&[0.0, 1.0], 1.0, false).unwrap();
        svd.take_sample(&[1.0, 1.0], 2.0, false).unwrap();

        assert_eq!(svd.spatial_basis().unwrap().num_columns(), 2);
        let vt = svd.temporal_basis().unwrap();
        assert_eq!((vt.num_rows(), vt.num_columns()), (2, 3));
    }

    #[test]
    fn test_fold_keeps_sample_count() {
        let mut svd = serial(3, 2);
        svd.take_sample(&[1.0, 0.0, 0.0], 0.0, false).unwrap();
        svd.take_sample(&[0.0, 1.0, 0.0], 1.0, false).unwrap();

        // Allowed on a full interval since no column is added.
        assert!(svd.take_sample(&[1.0, 0.0, 0.0], 2.0, true).unwrap());
        assert_eq!(svd.num_samples(), 2);
        assert!(!svd.is_basis_current());

        let sigma = svd.singular_values().unwrap();
        assert_abs_diff_eq!(sigma.item(0, 0), 2.0_f64.sqrt(), epsilon = 1e-10);
        assert_abs_diff_eq!(sigma.item(1, 1), 1.0, epsilon = 1e-10);

        // The span is unchanged: U Uᵗ still projects onto e1, e2.
        let u = svd.spatial_basis().unwrap().as_array().clone();
        let p = u.dot(&u.t());
        assert_abs_diff_eq!(p[[0, 0]], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p[[1, 1]], 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(p[[2, 2]], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fold_drops_component_outside_span() {
        let mut svd = serial(3, 4);
        svd.take_sample(&[2.0, 0.0, 0.0], 0.0, false).unwrap();

        // Only the e1 component of the folded sample survives.
        svd.take_sample(&[0.0, 0.0, 5.0], 1.0, true).unwrap();
        let sigma = svd.singular_values().unwrap();
        assert_eq!(sigma.num_rows(), 1);
        assert_abs_diff_eq!(sigma.item(0, 0), 2.0, epsilon = 1e-10);
    }

    #[test]
    fn test_fold_on_empty_interval_takes_sample() {
        let mut svd = serial(2, 2);
        assert!(svd.take_sample(&[3.0, 4.0], 0.0, true).unwrap());
        assert_eq!(svd.num_samples(), 1);
        assert_abs_diff_eq!(svd.singular_values().unwrap().item(0, 0), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_samples() {
        let mut svd = serial(2, 2);
        assert!(matches!(svd.spatial_basis(), Err(SvdError::NoSamples)));
        assert!(matches!(svd.compute_basis(), Err(SvdError::NoSamples)));
    }

    #[test]
    fn test_solver_failure_is_reported() {
        let mut svd = StaticSvd::with_solver(
            2,
            2,
            false,
            Arc::new(SelfCommunicator::new()),
            Box::new(FailingSvd),
        )
        .unwrap();
        svd.take_sample(&[1.0, 0.0], 0.0, false).unwrap();

        assert!(matches!(
            svd.singular_values(),
            Err(SvdError::Solver(SolverError::NoConvergence { .. }))
        ));
        assert!(!svd.is_basis_current());
    }

    #[test]
    fn test_backends_and_debug_agree() {
        let samples = [[1.0, 2.0, 3.0], [3.0, 1.0, -1.0]];
        let mut faer = StaticSvd::new(3, 2, true, Arc::new(SelfCommunicator::new())).unwrap();
        let mut nalg = StaticSvd::with_solver(
            3,
            2,
            false,
            Arc::new(SelfCommunicator::new()),
            Box::new(NalgebraSvd::default()),
        )
        .unwrap();
        for (t, s) in samples.iter().enumerate() {
            faer.take_sample(s, t as f64, false).unwrap();
            nalg.take_sample(s, t as f64, false).unwrap();
        }

        let a = faer.singular_values().unwrap().clone();
        let b = nalg.singular_values().unwrap();
        for i in 0..2 {
            assert_abs_diff_eq!(a.item(i, i), b.item(i, i), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_start_new_interval() {
        let mut svd = serial(2, 1);
        svd.take_sample(&[1.0, 1.0], 3.0, false).unwrap();
        svd.compute_basis().unwrap();
        assert!(!svd.take_sample(&[1.0, 0.0], 4.0, false).unwrap());

        svd.start_new_interval();
        assert_eq!(svd.num_samples(), 0);
        assert!(!svd.is_basis_current());
        assert_eq!(svd.interval_start_time(), None);
        assert!(svd.take_sample(&[1.0, 0.0], 4.0, false).unwrap());
        assert_eq!(svd.interval_start_time(), Some(4.0));
    }

    #[test]
    fn test_trait_object() {
        let mut basis: Box<dyn SvdBasis> = Box::new(serial(2, 2));
        assert_eq!(basis.method_name(), "Static SVD");
        assert!(basis.take_sample(&[0.0, 2.0], 0.0, false).unwrap());
        assert_abs_diff_eq!(basis.singular_values().unwrap().item(0, 0), 2.0, epsilon = 1e-12);
        assert!(basis.is_basis_current());
    }
}
