//! Run driver: one full run to `end_time`, and ensembles of independent runs.

use crate::config::RunConfig;
use crate::core::random::{entropy_seed, seeded_rng, UniformSource};
use crate::core::sim::Simulation;
use crate::error::{Error, Result};
use crate::trajectory::{Frame, NullSink, SnapshotSink};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Cooperative stop request, checked between steps.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Signal in the running state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every run holding a clone to stop before its next step.
    pub fn stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Simulated time reached the configured end time.
    EndTime,
    /// The total rate dropped to zero: every defect recombined, or both jump
    /// rates underflowed at a very low temperature.
    Exhausted,
    /// A [`StopSignal`] was raised.
    Stopped,
}

/// Result of one run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunResult {
    /// Active vacancies plus interstitials at the end of the run.
    pub defects_surviving: usize,
    /// Vacancy jumps performed.
    pub jumps_v: u64,
    /// Interstitial jumps performed.
    pub jumps_i: u64,
    /// Gillespie steps taken.
    pub steps: u64,
    /// Simulated time at termination (fs).
    pub time: f64,
    /// Why the run ended.
    pub termination: Termination,
}

/// Run one simulation from t = 0 until `config.end_time`.
///
/// Writes the initial frame (step 0), then a frame and a progress line after
/// every step whose 0-based index is a multiple of `config.write_frequency`.
/// Running out of defects ends the run early with [`Termination::Exhausted`].
pub fn run<S, K>(
    config: &RunConfig,
    source: S,
    sink: &mut K,
    stop: Option<&StopSignal>,
) -> Result<RunResult>
where
    S: UniformSource,
    K: SnapshotSink + ?Sized,
{
    let sim = Simulation::new(config, source)?;
    run_simulation(config, sim, sink, stop)
}

/// Drive an already constructed simulation to `config.end_time`.
pub fn run_simulation<S, K>(
    config: &RunConfig,
    mut sim: Simulation<S>,
    sink: &mut K,
    stop: Option<&StopSignal>,
) -> Result<RunResult>
where
    S: UniformSource,
    K: SnapshotSink + ?Sized,
{
    let w_freq = config.write_frequency.max(1);
    log_progress(&sim);
    sink.write_frame(&Frame {
        time: sim.time(),
        step: 0,
        population: sim.population(),
    })?;

    let mut termination = Termination::EndTime;
    while sim.time() < config.end_time {
        if stop.is_some_and(StopSignal::is_stopped) {
            warn!(
                t = sim.time(),
                steps = sim.steps(),
                "run stopped on request"
            );
            termination = Termination::Stopped;
            break;
        }
        let report = match sim.step() {
            Ok(r) => r,
            Err(Error::DegenerateRate { gtot }) => {
                warn!(
                    t = sim.time(),
                    steps = sim.steps(),
                    gtot,
                    "total rate is zero, ending run early"
                );
                termination = Termination::Exhausted;
                break;
            }
            Err(e) => return Err(e),
        };
        if report.index % w_freq == 0 {
            log_progress(&sim);
            sink.write_frame(&Frame {
                time: sim.time(),
                step: report.index,
                population: sim.population(),
            })?;
        }
    }

    let result = RunResult {
        defects_surviving: sim.defects_surviving(),
        jumps_v: sim.jumps_vacancy(),
        jumps_i: sim.jumps_interstitial(),
        steps: sim.steps(),
        time: sim.time(),
        termination,
    };
    info!(
        defects = result.defects_surviving,
        jumps_v = result.jumps_v,
        jumps_i = result.jumps_i,
        steps = result.steps,
        ?termination,
        "run finished"
    );
    Ok(result)
}

/// Run once on stream 0 of `seed`.
pub fn run_seeded<K: SnapshotSink + ?Sized>(
    config: &RunConfig,
    seed: u64,
    sink: &mut K,
) -> Result<RunResult> {
    run(config, seeded_rng(seed, 0), sink, None)
}

fn log_progress<S: UniformSource>(sim: &Simulation<S>) {
    let pop = sim.population();
    info!(
        t = sim.time(),
        n_v = pop.num_vacancies(),
        n_i = pop.num_interstitials(),
        jumps_v = sim.jumps_vacancy(),
        jumps_i = sim.jumps_interstitial(),
        "progress"
    );
}

/// Independent runs sharing one configuration; run `k` uses stream `k` of the base seed.
#[derive(Debug, Clone)]
pub struct Ensemble {
    config: RunConfig,
    seed: u64,
    stop: Option<StopSignal>,
}

impl Ensemble {
    /// Validate `config` and fix the base seed (drawn from entropy if unset).
    pub fn new(config: RunConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(entropy_seed);
        Ok(Self {
            config,
            seed,
            stop: None,
        })
    }

    /// Attach a stop signal shared by every run.
    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Validated configuration shared by every run.
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Base seed actually used.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run every member in order, all writing to `sink`.
    pub fn run_sequential<K: SnapshotSink + ?Sized>(&self, sink: &mut K) -> Result<Vec<RunResult>> {
        let mut results = Vec::with_capacity(self.config.runs);
        for k in 0..self.config.runs {
            info!(
                run = k + 1,
                of = self.config.runs,
                seed = self.seed,
                "starting run"
            );
            results.push(self.run_member(k, sink)?);
        }
        Ok(results)
    }

    /// Run every member on the rayon pool without trajectory output.
    ///
    /// Results are in run order and equal to [`run_sequential`](Self::run_sequential)'s.
    pub fn run_parallel(&self) -> Result<Vec<RunResult>> {
        (0..self.config.runs)
            .into_par_iter()
            .map(|k| self.run_member(k, &mut NullSink))
            .collect()
    }

    fn run_member<K: SnapshotSink + ?Sized>(&self, k: usize, sink: &mut K) -> Result<RunResult> {
        run(
            &self.config,
            seeded_rng(self.seed, k as u64),
            sink,
            self.stop.as_ref(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trajectory::OwnedFrame;
    use tracing_test::traced_test;

    fn config() -> RunConfig {
        RunConfig::new(5, 5, 1500.0, 4.0, 20_000.0, 10, 3).with_seed(77)
    }

    #[test]
    fn frames_follow_write_frequency() -> Result<()> {
        let mut frames: Vec<OwnedFrame> = Vec::new();
        let res = run_seeded(&config(), 1, &mut frames)?;
        assert_eq!(frames[0].step, 0);
        assert_eq!(frames[0].time, 0.0);
        assert_eq!(frames[0].entries.len(), 10);
        // initial frame plus one per step index divisible by 10
        let expected = 1 + (res.steps + 9) / 10;
        assert_eq!(frames.len() as u64, expected);
        assert!(frames[1..].iter().all(|f| f.step % 10 == 0));
        Ok(())
    }

    #[test]
    fn zero_end_time_takes_no_steps() -> Result<()> {
        let c = RunConfig {
            end_time: 0.0,
            ..config()
        };
        let res = run_seeded(&c, 1, &mut NullSink)?;
        assert_eq!(res.steps, 0);
        assert_eq!(res.defects_surviving, 10);
        assert_eq!(res.termination, Termination::EndTime);
        Ok(())
    }

    #[test]
    fn stop_signal_ends_run() -> Result<()> {
        let stop = StopSignal::new();
        stop.stop();
        let res = run(&config(), seeded_rng(1, 0), &mut NullSink, Some(&stop))?;
        assert_eq!(res.termination, Termination::Stopped);
        assert_eq!(res.steps, 0);
        Ok(())
    }

    #[test]
    #[traced_test]
    fn exhaustion_is_logged_not_raised() {
        // zero-spread cascades start every pair on top of each other
        let mut m = crate::core::material::Material::silicon();
        m.sigma_vacancy = 0.0;
        m.sigma_interstitial = 0.0;
        let c = RunConfig::new(2, 2, 1500.0, 10.0, 1e12, 1, 1).with_material(m);
        let res = run_seeded(&c, 3, &mut NullSink).expect("run");
        assert_eq!(res.termination, Termination::Exhausted);
        assert_eq!(res.defects_surviving, 0);
        assert!(logs_contain("total rate is zero"));
    }

    #[test]
    fn frozen_rates_end_run_with_defects_left() -> Result<()> {
        // exp(-E / kT) underflows to 0 for both species at 1 K
        let c = RunConfig::new(3, 3, 1.0, 1.0, 1e6, 1, 1);
        let res = run_seeded(&c, 5, &mut NullSink)?;
        assert_eq!(res.termination, Termination::Exhausted);
        assert_eq!(res.steps, 0);
        assert_eq!(res.defects_surviving, 6);
        Ok(())
    }

    #[test]
    fn parallel_matches_sequential() -> Result<()> {
        let ens = Ensemble::new(config())?;
        assert_eq!(ens.seed(), 77);
        let seq = ens.run_sequential(&mut NullSink)?;
        let par = ens.run_parallel()?;
        assert_eq!(seq.len(), 3);
        assert_eq!(seq, par);
        Ok(())
    }

    #[test]
    fn ensemble_rejects_invalid_config() {
        let c = RunConfig {
            runs: 0,
            ..config()
        };
        assert!(Ensemble::new(c).is_err());
    }
}
