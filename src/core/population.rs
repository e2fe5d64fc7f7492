use crate::core::random::{gaussian, UniformSource};
use crate::core::vec3::Vec3;
use crate::error::{Error, Result};

/// Point-defect species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Species {
    /// Missing lattice atom.
    Vacancy,
    /// Extra atom between lattice sites.
    Interstitial,
}

impl Species {
    /// Numeric type label used in trajectory frames (0 = vacancy, 1 = interstitial).
    #[inline]
    pub fn type_id(self) -> u8 {
        match self {
            Species::Vacancy => 0,
            Species::Interstitial => 1,
        }
    }

    /// Inverse of [`type_id`](Species::type_id).
    pub fn from_type_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Species::Vacancy),
            1 => Some(Species::Interstitial),
            _ => None,
        }
    }
}

/// Vacancy and interstitial positions sharing one fixed backing arena.
///
/// Layout: `arena[0..n_v]` holds vacancies, `arena[n_v..n_v + n_i]` interstitials.
/// The split point is always the active vacancy count. Both counts only ever
/// shrink, one vacancy and one interstitial at a time, and the arena is never
/// reallocated after construction. Slots past `n_v + n_i` are stale.
///
/// Indices are logical and unstable: a recombination pass may move any defect.
#[derive(Debug, Clone)]
pub struct Population {
    arena: Vec<Vec3>,
    n_v: usize,
    n_i: usize,
}

impl Population {
    /// Sample `n_v` vacancies and `n_i` interstitials around the origin.
    ///
    /// Each defect gets a uniformly random direction and radius `|N(0, sigma^2)|`
    /// for its species. Vacancies are drawn first.
    ///
    /// Errors:
    /// - `Error::InvalidConfig` if a sigma is negative or not finite.
    /// - `Error::ResourceExhausted` if the arena cannot be allocated.
    pub fn initialize<S: UniformSource + ?Sized>(
        n_v: usize,
        n_i: usize,
        sigma_v: f64,
        sigma_i: f64,
        source: &mut S,
    ) -> Result<Self> {
        for (name, s) in [("sigma_v", sigma_v), ("sigma_i", sigma_i)] {
            if !s.is_finite() || s < 0.0 {
                let message = format!("{name} must be finite and >= 0");
                return Err(Error::InvalidConfig(message));
            }
        }
        let total = n_v
            .checked_add(n_i)
            .ok_or_else(|| Error::InvalidConfig("defect count overflows".into()))?;

        let mut arena = Vec::new();
        arena.try_reserve_exact(total)?;
        for _ in 0..n_v {
            arena.push(sample_radial(source, sigma_v));
        }
        for _ in 0..n_i {
            arena.push(sample_radial(source, sigma_i));
        }
        Ok(Self { arena, n_v, n_i })
    }

    /// Build a population from explicit positions.
    ///
    /// Errors: `Error::InvalidConfig` if any coordinate is not finite.
    pub fn from_positions(vacancies: &[Vec3], interstitials: &[Vec3]) -> Result<Self> {
        if !vacancies.iter().chain(interstitials).all(Vec3::is_finite) {
            return Err(Error::InvalidConfig("positions must be finite".into()));
        }
        let mut arena = Vec::new();
        arena.try_reserve_exact(vacancies.len() + interstitials.len())?;
        arena.extend_from_slice(vacancies);
        arena.extend_from_slice(interstitials);
        Ok(Self {
            arena,
            n_v: vacancies.len(),
            n_i: interstitials.len(),
        })
    }

    /// Active vacancy count.
    #[inline]
    pub fn num_vacancies(&self) -> usize {
        self.n_v
    }

    /// Active interstitial count.
    #[inline]
    pub fn num_interstitials(&self) -> usize {
        self.n_i
    }

    /// Total active defects.
    #[inline]
    pub fn len(&self) -> usize {
        self.n_v + self.n_i
    }

    /// True once every defect has recombined.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the backing arena (the initial defect count).
    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Species of the defect at a logical index.
    #[inline]
    pub fn species_of(&self, index: usize) -> Species {
        if index < self.n_v {
            Species::Vacancy
        } else {
            Species::Interstitial
        }
    }

    /// Position at a logical index, if it is active.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        (index < self.len()).then(|| self.arena[index])
    }

    /// Active vacancy positions.
    pub fn vacancies(&self) -> &[Vec3] {
        &self.arena[..self.n_v]
    }

    /// Active interstitial positions.
    pub fn interstitials(&self) -> &[Vec3] {
        &self.arena[self.n_v..self.n_v + self.n_i]
    }

    /// Active defects in logical order: vacancies, then interstitials.
    pub fn iter(&self) -> impl Iterator<Item = (Species, Vec3)> + '_ {
        self.arena[..self.len()]
            .iter()
            .enumerate()
            .map(move |(k, &r)| (self.species_of(k), r))
    }

    /// Displace the defect at `index`. The caller guarantees `index < len()`.
    #[inline]
    pub fn jump(&mut self, index: usize, displacement: Vec3) {
        debug_assert!(index < self.len(), "jump index {index} out of active range");
        self.arena[index] += displacement;
    }

    /// Remove every vacancy-interstitial pair within `r_rec`; returns the number of pairs removed.
    ///
    /// Pairs are visited vacancy-major. The loop bounds are the live counts, so a
    /// removal changes which slots the rest of the same pass visits: the slot just
    /// refilled at `jv` is compared only against the interstitials after `ji`, and
    /// pairs skipped this way wait for the next pass.
    pub fn recombine_all(&mut self, r_rec: f64) -> usize {
        let mut removed = 0;
        let mut jv = 0;
        while jv < self.n_v {
            let mut ji = 0;
            // once jv falls off the shrunk vacancy range, arena[jv] is an interstitial
            while ji < self.n_i && jv < self.n_v {
                let d = self.arena[jv].distance(&self.arena[self.n_v + ji]);
                if d <= r_rec {
                    self.remove_pair(jv, ji);
                    removed += 1;
                }
                ji += 1;
            }
            jv += 1;
        }
        removed
    }

    /// O(1) removal of vacancy slot `jv` and interstitial slot `ji` (relative to the split).
    ///
    /// The last vacancy fills `jv`, the last interstitial moves into the freed last
    /// vacancy slot (becoming interstitial 0 once the split moves down), and the
    /// second-to-last interstitial fills `ji`. When `ji` is the last interstitial
    /// this keeps it and drops the second-to-last one instead; counts stay exact.
    fn remove_pair(&mut self, jv: usize, ji: usize) {
        let (nv, ni) = (self.n_v, self.n_i);
        debug_assert!(jv < nv && ji < ni);
        self.arena[jv] = self.arena[nv - 1];
        self.arena[nv - 1] = self.arena[nv + ni - 1];
        if ni > 1 {
            self.arena[nv + ji] = self.arena[nv + ni - 2];
        }
        self.n_v -= 1;
        self.n_i -= 1;
    }
}

fn sample_radial<S: UniformSource + ?Sized>(source: &mut S, sigma: f64) -> Vec3 {
    let dir = Vec3::random_unit(source);
    dir * gaussian(source, 0.0, sigma).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::random::seeded_rng;

    fn p(x: f64) -> Vec3 {
        Vec3::new(x, 0.0, 0.0)
    }

    #[test]
    fn initialize_sizes_and_split() -> Result<()> {
        let mut rng = seeded_rng(5, 0);
        let pop = Population::initialize(4, 7, 20.0, 60.0, &mut rng)?;
        assert_eq!(pop.num_vacancies(), 4);
        assert_eq!(pop.num_interstitials(), 7);
        assert_eq!(pop.len(), 11);
        assert_eq!(pop.vacancies().len(), 4);
        assert_eq!(pop.interstitials().len(), 7);
        assert_eq!(pop.species_of(3), Species::Vacancy);
        assert_eq!(pop.species_of(4), Species::Interstitial);
        assert!(pop.iter().all(|(_, r)| r.is_finite()));
        Ok(())
    }

    #[test]
    fn initialize_zero_sigma_collapses_to_origin() -> Result<()> {
        let mut rng = seeded_rng(5, 0);
        let pop = Population::initialize(3, 0, 0.0, 0.0, &mut rng)?;
        assert!(pop.vacancies().iter().all(|r| r.norm() == 0.0));
        Ok(())
    }

    #[test]
    fn initialize_rejects_negative_sigma() {
        let mut rng = seeded_rng(5, 0);
        let err = Population::initialize(1, 1, -1.0, 1.0, &mut rng).unwrap_err();
        assert!(err.to_string().contains("sigma_v"));
    }

    #[test]
    fn initial_spread_follows_species_sigma() -> Result<()> {
        // E|N(0, s^2)| = s * sqrt(2/pi)
        let mut rng = seeded_rng(11, 0);
        let pop = Population::initialize(4000, 4000, 20.0, 60.0, &mut rng)?;
        let mean_r = |xs: &[Vec3]| xs.iter().map(Vec3::norm).sum::<f64>() / xs.len() as f64;
        let k = (2.0 / std::f64::consts::PI).sqrt();
        assert!((mean_r(pop.vacancies()) / (20.0 * k) - 1.0).abs() < 0.05);
        assert!((mean_r(pop.interstitials()) / (60.0 * k) - 1.0).abs() < 0.05);
        Ok(())
    }

    #[test]
    fn jump_moves_only_target() -> Result<()> {
        let mut pop = Population::from_positions(&[p(0.0), p(1.0)], &[p(10.0)])?;
        pop.jump(2, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(pop.position(2), Some(Vec3::new(10.0, 2.0, 0.0)));
        assert_eq!(pop.position(0), Some(p(0.0)));
        assert_eq!(pop.position(3), None);
        Ok(())
    }

    #[test]
    fn remove_pair_middle_slots() -> Result<()> {
        // v: A B C | i: X Y Z W ; recombine B with Y
        let v = [p(0.0), p(100.0), p(200.0)];
        let i = [p(1000.0), p(100.5), p(3000.0), p(4000.0)];
        let mut pop = Population::from_positions(&v, &i)?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert_eq!(pop.vacancies(), &[p(0.0), p(200.0)]);
        // last interstitial first, then X, with Y's slot refilled by Z
        assert_eq!(pop.interstitials(), &[p(4000.0), p(1000.0), p(3000.0)]);
        Ok(())
    }

    #[test]
    fn remove_pair_single_interstitial() -> Result<()> {
        let mut pop = Population::from_positions(&[p(0.0), p(-500.0)], &[p(0.5)])?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert_eq!(pop.vacancies(), &[p(-500.0)]);
        assert!(pop.interstitials().is_empty());
        assert_eq!(pop.capacity(), 3);
        Ok(())
    }

    #[test]
    fn remove_pair_last_interstitial_keeps_it() -> Result<()> {
        // v: A | i: X Y ; A recombines with Y (the last interstitial).
        // The swap policy keeps Y and drops X; only the counts are exact.
        let mut pop = Population::from_positions(&[p(0.0), p(-900.0)], &[p(500.0), p(0.5)])?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert_eq!(pop.vacancies(), &[p(-900.0)]);
        assert_eq!(pop.interstitials(), &[p(0.5)]);
        Ok(())
    }

    #[test]
    fn live_bound_defers_pairs_to_next_pass() -> Result<()> {
        // v: A B | i: X Y. A-X and B-Y are both in range.
        // Removing (A, X) refills slot 0 with B and the interstitial range with Y,
        // but the scan continues at ji = 1 >= n_i, so B-Y waits for the next pass.
        let mut pop = Population::from_positions(&[p(0.0), p(50.0)], &[p(0.5), p(50.5)])?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert_eq!(pop.vacancies(), &[p(50.0)]);
        assert_eq!(pop.interstitials(), &[p(50.5)]);
        assert_eq!(pop.recombine_all(1.0), 1);
        assert!(pop.is_empty());
        Ok(())
    }

    #[test]
    fn refilled_vacancy_checked_against_remaining_interstitials() -> Result<()> {
        // v: A B | i: X Y Z. A-X in range; B-Z in range.
        // After (A, X): v = [B], i = [Z, Y]; scan resumes at ji = 1 (Y), B-Y out of range.
        let v = [p(0.0), p(50.0)];
        let i = [p(0.5), p(900.0), p(50.5)];
        let mut pop = Population::from_positions(&v, &i)?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert_eq!(pop.vacancies(), &[p(50.0)]);
        assert_eq!(pop.interstitials(), &[p(50.5), p(900.0)]);
        Ok(())
    }

    #[test]
    fn scan_stops_when_vacancies_run_out() -> Result<()> {
        // v: A | i: X Y Z. A-X in range and Y-Z close to each other.
        // Removing (A, X) leaves i = [Z, Y] starting at slot 0. The scan must stop
        // there instead of reading Z as a vacancy and pairing it with Y.
        let i = [p(0.5), p(500.0), p(500.5)];
        let mut pop = Population::from_positions(&[p(0.0)], &i)?;
        assert_eq!(pop.recombine_all(1.0), 1);
        assert!(pop.vacancies().is_empty());
        assert_eq!(pop.interstitials(), &[p(500.5), p(500.0)]);
        assert_eq!(pop.recombine_all(1.0), 0);
        Ok(())
    }

    #[test]
    fn single_species_never_recombines() -> Result<()> {
        let mut only_v = Population::from_positions(&[p(0.0), p(0.1)], &[])?;
        let mut only_i = Population::from_positions(&[], &[p(0.0), p(0.1)])?;
        assert_eq!(only_v.recombine_all(100.0), 0);
        assert_eq!(only_i.recombine_all(100.0), 0);
        assert_eq!(only_v.len(), 2);
        assert_eq!(only_i.len(), 2);
        Ok(())
    }

    #[test]
    fn everything_in_range_never_overruns() -> Result<()> {
        let mut rng = seeded_rng(3, 0);
        let mut pop = Population::initialize(9, 5, 1.0, 1.0, &mut rng)?;
        let mut total = 0;
        while pop.num_interstitials() > 0 && pop.num_vacancies() > 0 {
            let n = pop.recombine_all(1e6);
            assert!(n > 0);
            total += n;
        }
        assert_eq!(total, 5);
        assert_eq!(pop.num_vacancies(), 4);
        assert_eq!(pop.len(), 4);
        Ok(())
    }

    #[test]
    fn species_type_ids() {
        assert_eq!(Species::Vacancy.type_id(), 0);
        assert_eq!(Species::Interstitial.type_id(), 1);
        assert_eq!(Species::from_type_id(1), Some(Species::Interstitial));
        assert_eq!(Species::from_type_id(2), None);
    }
}
