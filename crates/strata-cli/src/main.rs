//! Strata command-line interface.
//!
//! Compute a static SVD basis from a TOML job file:
//! ```sh
//! strata run job.toml
//! strata run job.toml --ranks 4
//! strata validate job.toml
//! ```

mod config;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Strata: distributed static SVD basis generation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Factorize the samples named in a job file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Number of ranks (overrides the config file setting).
        #[arg(short, long)]
        ranks: Option<usize>,
    },
    /// Validate a configuration file and its samples without factorizing.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, ranks } => {
            println!("Strata static SVD");
            println!("=================");
            let mut job = config::load_config(&config)?;
            if let Some(ranks) = ranks {
                job.override_ranks(ranks);
            }
            println!("Configuration: {}", config.display());

            let summaries = runner::run_job(&job)?;
            runner::print_summary(&summaries);
            Ok(())
        }
        Commands::Validate { config } => {
            let job = config::load_config(&config)?;
            job.validate()?;
            let set = runner::load_samples(&job.samples.path, job.samples.has_time_column)?;
            runner::partition(set.dim(), job.comm.ranks)?;
            println!(
                "Configuration is valid: {} ({} samples of dimension {})",
                config.display(),
                set.len(),
                set.dim()
            );
            Ok(())
        }
    }
}
