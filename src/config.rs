//! Run configuration.

use crate::core::material::Material;
use crate::error::{Error, Result};

/// Configuration shared by every run of an ensemble.
///
/// The seven run parameters have no defaults; [`RunConfig::new`] takes all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Initial number of vacancies.
    pub n_vacancies: usize,

    /// Initial number of interstitials.
    pub n_interstitials: usize,

    /// Temperature (K).
    pub temperature: f64,

    /// Vacancy-interstitial recombination distance (Å).
    pub recombination_distance: f64,

    /// Simulated end time (fs).
    pub end_time: f64,

    /// Trajectory frame and progress log interval, in steps.
    pub write_frequency: u64,

    /// Number of independent runs in the ensemble.
    pub runs: usize,

    /// Rate and geometry parameters.
    pub material: Material,

    /// Base seed; `None` draws one from OS entropy.
    pub seed: Option<u64>,
}

impl RunConfig {
    /// Create a configuration for `material = silicon` and an entropy seed.
    pub fn new(
        n_vacancies: usize,
        n_interstitials: usize,
        temperature: f64,
        recombination_distance: f64,
        end_time: f64,
        write_frequency: u64,
        runs: usize,
    ) -> Self {
        Self {
            n_vacancies,
            n_interstitials,
            temperature,
            recombination_distance,
            end_time,
            write_frequency,
            runs,
            material: Material::silicon(),
            seed: None,
        }
    }

    /// Set the material parameters.
    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    /// Set the base random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Initial defect count of each run.
    pub fn total_defects(&self) -> usize {
        self.n_vacancies + self.n_interstitials
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<()> {
        if self.n_vacancies == 0 && self.n_interstitials == 0 {
            return Err(Error::InvalidConfig(
                "at least one vacancy or interstitial is required".into(),
            ));
        }
        if self.n_vacancies.checked_add(self.n_interstitials).is_none() {
            return Err(Error::InvalidConfig("defect count overflows".into()));
        }
        if !self.end_time.is_finite() || self.end_time < 0.0 {
            return Err(Error::InvalidConfig(
                "end_time must be finite and >= 0".into(),
            ));
        }
        if self.write_frequency == 0 {
            return Err(Error::InvalidConfig("write_frequency must be > 0".into()));
        }
        if self.runs == 0 {
            return Err(Error::InvalidConfig("runs must be > 0".into()));
        }
        self.validate_physics()
    }

    /// Validate the parameters that enter the rates and the recombination check.
    pub fn validate_physics(&self) -> Result<()> {
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return Err(Error::InvalidConfig(
                "temperature must be finite and > 0".into(),
            ));
        }
        if !self.recombination_distance.is_finite() || self.recombination_distance < 0.0 {
            return Err(Error::InvalidConfig(
                "recombination_distance must be finite and >= 0".into(),
            ));
        }
        self.material.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> RunConfig {
        RunConfig::new(150, 150, 1500.0, 4.0, 1e9, 1000, 1)
    }

    #[test]
    fn reference_setup_is_valid() -> Result<()> {
        let c = base();
        c.validate()?;
        assert_eq!(c.total_defects(), 300);
        assert_eq!(c.material, Material::silicon());
        assert_eq!(c.seed, None);
        Ok(())
    }

    #[test]
    fn single_species_is_valid() -> Result<()> {
        let only_i = RunConfig {
            n_vacancies: 0,
            ..base()
        };
        let only_v = RunConfig {
            n_interstitials: 0,
            ..base()
        };
        only_i.validate()?;
        only_v.validate()?;
        Ok(())
    }

    #[test]
    fn rejects_empty_population() {
        let c = RunConfig {
            n_vacancies: 0,
            n_interstitials: 0,
            ..base()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn rejects_bad_temperature() {
        for t in [0.0, -10.0, f64::NAN, f64::INFINITY] {
            let c = RunConfig {
                temperature: t,
                ..base()
            };
            let err = c.validate().unwrap_err();
            assert!(err.to_string().contains("temperature"), "{t}: {err}");
        }
    }

    #[test]
    fn rejects_zero_write_frequency_and_runs() {
        let no_frames = RunConfig {
            write_frequency: 0,
            ..base()
        };
        let no_runs = RunConfig { runs: 0, ..base() };
        assert!(no_frames.validate().is_err());
        assert!(no_runs.validate().is_err());
    }

    #[test]
    fn rejects_negative_distance_and_time() {
        let negative_r = RunConfig {
            recombination_distance: -1.0,
            ..base()
        };
        let negative_t = RunConfig {
            end_time: -1.0,
            ..base()
        };
        // zero end time is a valid no-op run
        let zero_t = RunConfig {
            end_time: 0.0,
            ..base()
        };
        assert!(negative_r.validate().is_err());
        assert!(negative_t.validate().is_err());
        assert!(zero_t.validate().is_ok());
    }

    #[test]
    fn builders() {
        let m = Material {
            hop_distance: 3.0,
            ..Material::silicon()
        };
        let c = base().with_seed(9).with_material(m);
        assert_eq!(c.seed, Some(9));
        assert_eq!(c.material.hop_distance, 3.0);
    }
}
