//! defectsim CLI
//!
//! Runs an ensemble of kinetic Monte Carlo simulations of vacancies and
//! interstitials and prints the surviving fraction and the interstitial/vacancy
//! jump ratio with their sample standard deviations.

use anyhow::Context;
use clap::Parser;
use defectsim::stats::EnsembleStats;
use defectsim::trajectory::{NullSink, XyzWriter};
use defectsim::{Ensemble, RunConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "defectsim")]
#[command(about = "Kinetic Monte Carlo of vacancy-interstitial diffusion and recombination")]
#[command(version)]
struct Cli {
    /// Initial number of vacancies
    n_vacancies: usize,

    /// Initial number of interstitials
    n_interstitials: usize,

    /// Temperature (K)
    temperature: f64,

    /// Recombination distance (Å)
    recombination_distance: f64,

    /// Simulation time (fs)
    end_time: f64,

    /// Trajectory write frequency (steps)
    write_frequency: u64,

    /// Number of runs to average over
    runs: usize,

    /// Base random seed (default: from OS entropy)
    #[arg(long)]
    seed: Option<u64>,

    /// Trajectory output file
    #[arg(short, long, default_value = "vi.xyz")]
    output: PathBuf,

    /// Do not write a trajectory
    #[arg(long)]
    no_trajectory: bool,

    /// Run ensemble members in parallel (implies --no-trajectory)
    #[arg(long)]
    parallel: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RunConfig::new(
        cli.n_vacancies,
        cli.n_interstitials,
        cli.temperature,
        cli.recombination_distance,
        cli.end_time,
        cli.write_frequency,
        cli.runs,
    );
    if let Some(seed) = cli.seed {
        config = config.with_seed(seed);
    }

    let ensemble = Ensemble::new(config).context("invalid run configuration")?;
    println!(
        "n_v={}, n_i={}, temp={}, r_rec={}, t_end={}, w_freq={}, nruns={}, seed={}",
        cli.n_vacancies,
        cli.n_interstitials,
        cli.temperature,
        cli.recombination_distance,
        cli.end_time,
        cli.write_frequency,
        cli.runs,
        ensemble.seed()
    );

    let results = if cli.parallel {
        ensemble.run_parallel()?
    } else if cli.no_trajectory {
        ensemble.run_sequential(&mut NullSink)?
    } else {
        let mut writer = XyzWriter::create(&cli.output)
            .with_context(|| format!("creating {}", cli.output.display()))?;
        let results = ensemble.run_sequential(&mut writer)?;
        writer.flush()?;
        results
    };

    for (k, r) in results.iter().enumerate() {
        println!(
            "run {}: defects={}, jumps_v={}, jumps_i={}, steps={}, t={}, end={:?}",
            k + 1,
            r.defects_surviving,
            r.jumps_v,
            r.jumps_i,
            r.steps,
            r.time,
            r.termination
        );
    }

    let stats = EnsembleStats::from_results(ensemble.config(), &results);
    println!(
        "fraction surviving: {:.20} +- {:.20}",
        stats.surviving_fraction.mean, stats.surviving_fraction.std_dev
    );
    println!(
        "ratio i/v: {:.20} +- {:.20}",
        stats.jump_ratio.mean, stats.jump_ratio.std_dev
    );
    Ok(())
}
