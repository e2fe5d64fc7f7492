//! Ensemble statistics over independent runs.

use crate::config::RunConfig;
use crate::driver::RunResult;

/// Mean and sample standard deviation of a set of observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (divides by `n - 1`); 0 when fewer than two samples.
    pub std_dev: f64,
    /// Number of observations.
    pub samples: usize,
}

impl Summary {
    /// Summarize `values`. An empty input yields a NaN mean.
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        let mean = values.iter().map(|v| v / n as f64).sum::<f64>();
        let std_dev = if n > 1 {
            values
                .iter()
                .map(|v| (v - mean) * (v - mean) / (n - 1) as f64)
                .sum::<f64>()
                .sqrt()
        } else {
            0.0
        };
        Self {
            mean: if n == 0 { f64::NAN } else { mean },
            std_dev,
            samples: n,
        }
    }
}

/// Fraction of the initial defects still present at the end of a run.
pub fn surviving_fraction(result: &RunResult, initial_defects: usize) -> f64 {
    result.defects_surviving as f64 / initial_defects as f64
}

/// Interstitial-to-vacancy jump ratio; `None` when no vacancy jumped.
pub fn jump_ratio(result: &RunResult) -> Option<f64> {
    (result.jumps_v > 0).then(|| result.jumps_i as f64 / result.jumps_v as f64)
}

/// Surviving fraction and jump ratio across an ensemble.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnsembleStats {
    /// Over every run.
    pub surviving_fraction: Summary,
    /// Over runs with at least one vacancy jump.
    pub jump_ratio: Summary,
}

impl EnsembleStats {
    /// Summarize `results` of runs started from `config`.
    pub fn from_results(config: &RunConfig, results: &[RunResult]) -> Self {
        let initial = config.total_defects();
        let fractions: Vec<f64> = results
            .iter()
            .map(|r| surviving_fraction(r, initial))
            .collect();
        let ratios: Vec<f64> = results.iter().filter_map(jump_ratio).collect();
        Self {
            surviving_fraction: Summary::from_values(&fractions),
            jump_ratio: Summary::from_values(&ratios),
        }
    }
}
