use crate::error::{Error, Result};

/// Boltzmann constant (eV/K).
pub const K_B: f64 = 8.617333262e-5;

/// Material and defect parameters entering the rate catalog and the initial layout.
///
/// Energies in eV, prefactors in 1/fs, lengths in Å.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    /// Vacancy jump-rate prefactor.
    pub w_vacancy: f64,
    /// Interstitial jump-rate prefactor.
    pub w_interstitial: f64,
    /// Vacancy migration activation energy.
    pub e_vacancy: f64,
    /// Interstitial migration activation energy.
    pub e_interstitial: f64,
    /// Hop length of every jump (nearest-neighbour distance).
    pub hop_distance: f64,
    /// Standard deviation of the initial vacancy radial profile.
    pub sigma_vacancy: f64,
    /// Standard deviation of the initial interstitial radial profile.
    pub sigma_interstitial: f64,
}

impl Material {
    /// Vacancies and interstitials in silicon, with a cascade-like initial spread.
    pub const fn silicon() -> Self {
        Self {
            w_vacancy: 0.001282,
            w_interstitial: 1.717,
            e_vacancy: 0.1,
            e_interstitial: 1.37,
            hop_distance: 2.35,
            sigma_vacancy: 20.0,
            sigma_interstitial: 60.0,
        }
    }

    /// Check that every parameter is finite and physically meaningful.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("w_vacancy", self.w_vacancy),
            ("w_interstitial", self.w_interstitial),
            ("hop_distance", self.hop_distance),
        ];
        for (name, v) in checks {
            if !v.is_finite() || v <= 0.0 {
                let message = format!("{name} must be finite and > 0");
                return Err(Error::InvalidConfig(message));
            }
        }
        let non_negative = [
            ("e_vacancy", self.e_vacancy),
            ("e_interstitial", self.e_interstitial),
            ("sigma_vacancy", self.sigma_vacancy),
            ("sigma_interstitial", self.sigma_interstitial),
        ];
        for (name, v) in non_negative {
            if !v.is_finite() || v < 0.0 {
                let message = format!("{name} must be finite and >= 0");
                return Err(Error::InvalidConfig(message));
            }
        }
        Ok(())
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::silicon()
    }
}
