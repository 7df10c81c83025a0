//! Job runner: loads samples, splits them across ranks and drives the
//! static SVD on every rank in lockstep.

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};

use strata_compute::{CommKind, Communicator, SelfCommunicator, ThreadWorld};
use strata_core::svd::StaticSvd;

use crate::config::JobConfig;

/// Samples read from the input file, one global state vector each.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleSet {
    pub times: Vec<f64>,
    pub samples: Vec<Vec<f64>>,
}

impl SampleSet {
    /// Global state dimension.
    pub fn dim(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }
}

/// What one rank reports after the factorization.
#[derive(Debug, Clone)]
pub struct RankSummary {
    pub rank: usize,
    pub rows: Range<usize>,
    pub accepted: usize,
    pub spatial_shape: (usize, usize),
    pub singular_values: Vec<f64>,
}

/// Read a sample file.
pub fn load_samples(path: &Path, has_time_column: bool) -> Result<SampleSet> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading samples from {}", path.display()))?;
    parse_samples(&content, has_time_column)
        .with_context(|| format!("parsing samples in {}", path.display()))
}

/// Parse CSV text with one sample per line. Blank lines and lines starting
/// with `#` are skipped. Without a time column, sample `i` is taken at
/// time `i`.
pub fn parse_samples(content: &str, has_time_column: bool) -> Result<SampleSet> {
    let mut times = Vec::new();
    let mut samples: Vec<Vec<f64>> = Vec::new();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let mut values = line
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().with_context(|| {
                    format!("line {}: '{}' is not a number", line_no + 1, field.trim())
                })
            })
            .collect::<Result<Vec<f64>>>()?;

        let time = if has_time_column {
            if values.is_empty() {
                anyhow::bail!("line {}: missing time column", line_no + 1);
            }
            values.remove(0)
        } else {
            samples.len() as f64
        };

        if values.is_empty() {
            anyhow::bail!("line {}: sample has no values", line_no + 1);
        }
        if let Some(first) = samples.first() {
            if first.len() != values.len() {
                anyhow::bail!(
                    "line {}: sample has {} values, expected {}",
                    line_no + 1,
                    values.len(),
                    first.len()
                );
            }
        }

        times.push(time);
        samples.push(values);
    }

    if samples.is_empty() {
        anyhow::bail!("no samples found");
    }
    Ok(SampleSet { times, samples })
}

/// Split `total_dim` rows into `ranks` contiguous blocks. The first
/// `total_dim % ranks` ranks own one extra row.
pub fn partition(total_dim: usize, ranks: usize) -> Result<Vec<Range<usize>>> {
    if ranks == 0 {
        anyhow::bail!("at least one rank is required");
    }
    if ranks > total_dim {
        anyhow::bail!(
            "cannot split {} rows across {} ranks; every rank needs at least one row",
            total_dim,
            ranks
        );
    }

    let base = total_dim / ranks;
    let extra = total_dim % ranks;
    let mut start = 0;
    Ok((0..ranks)
        .map(|rank| {
            let len = base + usize::from(rank < extra);
            let range = start..start + len;
            start += len;
            range
        })
        .collect())
}

/// Build one communicator per rank for the configured world.
fn build_world(job: &JobConfig) -> Result<Vec<Arc<dyn Communicator>>> {
    let settings = &job.comm.settings;
    match job.comm.kind {
        CommKind::Local => Ok(vec![Arc::new(SelfCommunicator::with_config(settings))]),
        CommKind::Threads => Ok(ThreadWorld::new(job.comm.ranks, settings)
            .context("creating thread world")?
            .into_iter()
            .map(|comm| Arc::new(comm) as Arc<dyn Communicator>)
            .collect()),
    }
}

/// Run a job from a parsed configuration.
pub fn run_job(job: &JobConfig) -> Result<Vec<RankSummary>> {
    job.validate()?;
    let set = load_samples(&job.samples.path, job.samples.has_time_column)?;
    run_samples(job, &set)
}

/// Factorize an in-memory sample set with the world described by `job`.
pub fn run_samples(job: &JobConfig, set: &SampleSet) -> Result<Vec<RankSummary>> {
    let world = build_world(job)?;
    let ranges = partition(set.dim(), world.len())?;
    let capacity = job.svd.samples_per_time_interval.unwrap_or(set.len());

    log::info!(
        "factorizing {} samples of dimension {} on {} rank(s) with the {:?} solver",
        set.len(),
        set.dim(),
        world.len(),
        job.svd.solver
    );

    thread::scope(|scope| {
        let handles: Vec<_> = world
            .into_iter()
            .zip(ranges)
            .map(|(comm, rows)| scope.spawn(move || run_rank(job, set, comm, rows, capacity)))
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .map_err(|_| anyhow::anyhow!("rank {} panicked", rank))?
            })
            .collect()
    })
}

fn run_rank(
    job: &JobConfig,
    set: &SampleSet,
    comm: Arc<dyn Communicator>,
    rows: Range<usize>,
    capacity: usize,
) -> Result<RankSummary> {
    let rank = comm.rank();
    let mut svd = StaticSvd::with_solver(
        rows.len(),
        capacity,
        job.svd.debug_algorithm,
        comm,
        job.svd.solver.build(),
    )
    .with_context(|| format!("rank {}: creating static SVD", rank))?;

    for (sample, &time) in set.samples.iter().zip(&set.times) {
        let accepted = svd
            .take_sample(&sample[rows.clone()], time, false)
            .with_context(|| format!("rank {}: sample at t={}", rank, time))?;
        if !accepted {
            log::warn!(
                "rank {}: time interval full after {} samples; ignoring the rest",
                rank,
                svd.num_samples()
            );
            break;
        }
    }

    svd.compute_basis()
        .with_context(|| format!("rank {}: computing basis", rank))?;

    let spatial = svd.spatial_basis()?;
    let spatial_shape = (spatial.num_rows(), spatial.num_columns());
    let sigma = svd.singular_values()?;
    let singular_values = (0..sigma.num_rows()).map(|i| sigma.item(i, i)).collect();

    Ok(RankSummary {
        rank,
        rows,
        accepted: svd.num_samples(),
        spatial_shape,
        singular_values,
    })
}

/// Print the singular values (identical on every rank) and each rank's
/// share of the spatial basis.
pub fn print_summary(summaries: &[RankSummary]) {
    if let Some(first) = summaries.first() {
        println!("Samples used: {}", first.accepted);
        println!("Singular values:");
        for (i, value) in first.singular_values.iter().enumerate() {
            println!("  σ[{}] = {:.6e}", i, value);
        }
    }
    println!("Spatial basis:");
    for summary in summaries {
        println!(
            "  rank {}: rows {}..{} -> {}x{}",
            summary.rank,
            summary.rows.start,
            summary.rows.end,
            summary.spatial_shape.0,
            summary.spatial_shape.1
        );
    }
}
