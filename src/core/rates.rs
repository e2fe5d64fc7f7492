use crate::core::material::{Material, K_B};
use crate::error::Result;

/// Arrhenius jump rate `w * exp(-E / (k_B T))`.
#[inline]
pub fn jump_rate(prefactor: f64, activation: f64, temp: f64) -> f64 {
    prefactor * (-activation / temp / K_B).exp()
}

/// Cumulative jump rates over the active population, vacancies first.
///
/// Rebuilt every step since recombination shrinks the active set. The buffer is
/// reused; its length always equals the active defect count of the last rebuild.
#[derive(Debug, Clone, Default)]
pub struct RateCatalog {
    cumulative: Vec<f64>,
    rate_v: f64,
    rate_i: f64,
}

impl RateCatalog {
    /// Empty catalog with room for `capacity` defects.
    ///
    /// Errors: `Error::ResourceExhausted` if the buffer cannot be allocated.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let mut cumulative = Vec::new();
        cumulative.try_reserve_exact(capacity)?;
        Ok(Self {
            cumulative,
            rate_v: 0.0,
            rate_i: 0.0,
        })
    }

    /// Recompute both species rates at `temp` and refill the running sum.
    pub fn rebuild(&mut self, material: &Material, temp: f64, n_v: usize, n_i: usize) -> f64 {
        self.rate_v = jump_rate(material.w_vacancy, material.e_vacancy, temp);
        self.rate_i = jump_rate(material.w_interstitial, material.e_interstitial, temp);

        self.cumulative.clear();
        let mut acc = 0.0;
        for _ in 0..n_v {
            acc += self.rate_v;
            self.cumulative.push(acc);
        }
        for _ in 0..n_i {
            acc += self.rate_i;
            self.cumulative.push(acc);
        }
        self.gtot()
    }

    /// Total transition rate (0 for an empty catalog).
    #[inline]
    pub fn gtot(&self) -> f64 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    /// Per-vacancy jump rate from the last rebuild (1/fs).
    pub fn vacancy_rate(&self) -> f64 {
        self.rate_v
    }

    /// Per-interstitial jump rate from the last rebuild (1/fs).
    pub fn interstitial_rate(&self) -> f64 {
        self.rate_i
    }

    /// Running sum of rates over the active population.
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Number of selectable events.
    pub fn len(&self) -> usize {
        self.cumulative.len()
    }

    /// True when no event can be selected.
    pub fn is_empty(&self) -> bool {
        self.cumulative.is_empty()
    }

    /// Index of the event chosen by `u` in (0, 1): the first `j` with `u * gtot <= cumulative[j]`.
    ///
    /// Linear scan from 0, so ties go to the lower index.
    pub fn select(&self, u: f64) -> Option<usize> {
        let threshold = u * self.gtot();
        self.cumulative.iter().position(|&g| threshold <= g)
    }
}
