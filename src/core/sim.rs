use crate::config::RunConfig;
use crate::core::material::Material;
use crate::core::population::{Population, Species};
use crate::core::random::UniformSource;
use crate::core::rates::RateCatalog;
use crate::core::vec3::Vec3;
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Outcome of a single Gillespie step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// 0-based index of this step.
    pub index: u64,
    /// Logical index of the defect that jumped (pre-recombination).
    pub event: usize,
    /// Species of the defect that jumped.
    pub species: Species,
    /// Applied displacement.
    pub displacement: Vec3,
    /// Pairs removed by the recombination pass of this step.
    pub recombined: usize,
    /// Total rate the step was drawn from.
    pub gtot: f64,
    /// Waiting time drawn for this step (fs).
    pub dt: f64,
    /// Simulated time after the step (fs).
    pub time: f64,
}

/// Kinetic Monte Carlo state of one run.
///
/// Owns the defect population, the rate catalog and the uniform source. Each
/// [`step`](Simulation::step) rebuilds the rates, picks one defect weighted by
/// its species rate, hops it by the nearest-neighbour distance in a random
/// direction, recombines close pairs and advances time by an exponential waiting
/// time drawn from the total rate.
#[derive(Debug)]
pub struct Simulation<S> {
    population: Population,
    rates: RateCatalog,
    source: S,
    material: Material,
    temperature: f64,
    r_rec: f64,
    time_now: f64,
    steps: u64,
    jumps_v: u64,
    jumps_i: u64,
}

impl<S: UniformSource> Simulation<S> {
    /// Sample the initial population from `config` and set up a run at t = 0.
    ///
    /// Errors: `Error::InvalidConfig` for an invalid configuration,
    /// `Error::ResourceExhausted` if the arrays cannot be allocated.
    pub fn new(config: &RunConfig, mut source: S) -> Result<Self> {
        config.validate()?;
        let population = Population::initialize(
            config.n_vacancies,
            config.n_interstitials,
            config.material.sigma_vacancy,
            config.material.sigma_interstitial,
            &mut source,
        )?;
        Self::with_population(config, population, source)
    }

    /// Start a run from an explicit population; the configured counts are ignored.
    pub fn with_population(config: &RunConfig, population: Population, source: S) -> Result<Self> {
        config.validate_physics()?;
        let rates = RateCatalog::with_capacity(population.len())?;
        Ok(Self {
            population,
            rates,
            source,
            material: config.material,
            temperature: config.temperature,
            r_rec: config.recombination_distance,
            time_now: 0.0,
            steps: 0,
            jumps_v: 0,
            jumps_i: 0,
        })
    }

    /// Current simulated time (fs).
    pub fn time(&self) -> f64 {
        self.time_now
    }

    /// Steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Vacancy jumps so far.
    pub fn jumps_vacancy(&self) -> u64 {
        self.jumps_v
    }

    /// Interstitial jumps so far.
    pub fn jumps_interstitial(&self) -> u64 {
        self.jumps_i
    }

    /// Active defects.
    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Rate catalog as of the last step.
    pub fn rates(&self) -> &RateCatalog {
        &self.rates
    }

    /// Surviving defects: active vacancies plus active interstitials.
    pub fn defects_surviving(&self) -> usize {
        self.population.len()
    }

    /// Consume the simulation, returning its uniform source.
    pub fn into_source(self) -> S {
        self.source
    }

    /// Perform one Gillespie step.
    ///
    /// Errors: `Error::DegenerateRate` when the total rate is not positive (no
    /// active defects). Population, counters and clock are left untouched in that case.
    pub fn step(&mut self) -> Result<StepReport> {
        let gtot = self.rates.rebuild(
            &self.material,
            self.temperature,
            self.population.num_vacancies(),
            self.population.num_interstitials(),
        );
        if !gtot.is_finite() || gtot <= 0.0 {
            return Err(Error::DegenerateRate { gtot });
        }

        let u = self.source.uniform();
        let event = self.rates.select(u).unwrap_or(self.population.len() - 1);

        let displacement = Vec3::random_unit(&mut self.source) * self.material.hop_distance;
        let species = self.population.species_of(event);
        self.population.jump(event, displacement);
        match species {
            Species::Vacancy => self.jumps_v += 1,
            Species::Interstitial => self.jumps_i += 1,
        }
        trace!(event, ?species, "jump");

        let recombined = self.population.recombine_all(self.r_rec);
        if recombined > 0 {
            debug!(
                step = self.steps,
                pairs = recombined,
                n_v = self.population.num_vacancies(),
                n_i = self.population.num_interstitials(),
                "recombination"
            );
        }

        let dt = -self.source.uniform().ln() / gtot;
        self.time_now += dt;

        let index = self.steps;
        self.steps += 1;
        Ok(StepReport {
            index,
            event,
            species,
            displacement,
            recombined,
            gtot,
            dt,
            time: self.time_now,
        })
    }

    /// Step until the simulated time reaches `target_time`; returns the number of steps taken.
    ///
    /// Errors: propagates `Error::DegenerateRate` if the population runs out first.
    pub fn advance_to(&mut self, target_time: f64) -> Result<u64> {
        if target_time.is_nan() {
            return Err(Error::InvalidConfig("target_time must not be NaN".into()));
        }
        let start = self.steps;
        while self.time_now < target_time {
            self.step()?;
        }
        Ok(self.steps - start)
    }
}
