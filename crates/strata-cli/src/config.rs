//! TOML configuration deserialisation for basis generation jobs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use strata_compute::{CommConfig, CommKind};
use strata_core::svd::SolverKind;

/// Top-level job configuration.
#[derive(Debug, Deserialize)]
pub struct JobConfig {
    #[serde(default)]
    pub svd: SvdConfig,
    #[serde(default)]
    pub comm: CommSection,
    pub samples: SamplesConfig,
}

/// Basis generator parameters.
#[derive(Debug, Default, Deserialize)]
pub struct SvdConfig {
    /// Capacity of the time interval. Defaults to the number of samples in
    /// the input file.
    #[serde(default)]
    pub samples_per_time_interval: Option<usize>,
    /// Log the globalized matrix and the factors at debug level.
    #[serde(default)]
    pub debug_algorithm: bool,
    /// Dense solver: "faer" (default) or "nalgebra".
    #[serde(default)]
    pub solver: SolverKind,
}

/// Process world parameters.
#[derive(Debug, Deserialize)]
pub struct CommSection {
    /// "local" (single rank) or "threads".
    #[serde(default)]
    pub kind: CommKind,
    #[serde(default = "default_ranks")]
    pub ranks: usize,
    /// Tag and timeout shared by every rank.
    #[serde(flatten)]
    pub settings: CommConfig,
}

impl Default for CommSection {
    fn default() -> Self {
        Self {
            kind: CommKind::default(),
            ranks: default_ranks(),
            settings: CommConfig::default(),
        }
    }
}

fn default_ranks() -> usize {
    1
}

/// Sample input.
#[derive(Debug, Deserialize)]
pub struct SamplesConfig {
    /// CSV file with one global sample per line. Relative paths resolve
    /// against the directory of the job file.
    pub path: PathBuf,
    /// Whether the first column of every line is the sample time.
    #[serde(default)]
    pub has_time_column: bool,
}

impl JobConfig {
    /// Apply a `--ranks` override. More than one rank implies the thread
    /// world.
    pub fn override_ranks(&mut self, ranks: usize) {
        self.comm.ranks = ranks;
        if ranks > 1 {
            self.comm.kind = CommKind::Threads;
        }
    }

    /// Check the parts of the configuration that do not need the samples.
    pub fn validate(&self) -> Result<()> {
        if self.comm.ranks == 0 {
            anyhow::bail!("comm.ranks must be at least 1");
        }
        if self.comm.kind == CommKind::Local && self.comm.ranks != 1 {
            anyhow::bail!(
                "comm.kind = \"local\" runs a single rank, but comm.ranks = {}; use kind = \"threads\"",
                self.comm.ranks
            );
        }
        if self.svd.samples_per_time_interval == Some(0) {
            anyhow::bail!("svd.samples_per_time_interval must be positive");
        }
        if self.samples.path.as_os_str().is_empty() {
            anyhow::bail!("samples.path must not be empty");
        }
        Ok(())
    }

    /// Resolve the sample file against the job file location.
    pub fn resolve_paths(&mut self, job_path: &Path) {
        if self.samples.path.is_relative() {
            if let Some(dir) = job_path.parent() {
                self.samples.path = dir.join(&self.samples.path);
            }
        }
    }
}

/// Load and parse a TOML job configuration file.
pub fn load_config(path: &Path) -> Result<JobConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading job file {}", path.display()))?;
    let mut config = parse_config(&content)
        .with_context(|| format!("parsing job file {}", path.display()))?;
    config.resolve_paths(path);
    Ok(config)
}

/// Parse a job configuration from TOML text.
pub fn parse_config(content: &str) -> Result<JobConfig> {
    let config: JobConfig = toml::from_str(content)?;
    Ok(config)
}
