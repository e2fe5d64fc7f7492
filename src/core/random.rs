//! Random sampling on top of an injected uniform source.
//!
//! The engine never touches a global generator: every run owns a
//! [`UniformSource`], normally a [`SimRng`] seeded per run and stream.

use rand::distr::{Distribution, Open01};
use rand::{rng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::f64::consts::PI;

/// Generator used by the driver. Streams of one seed never overlap.
pub type SimRng = ChaCha8Rng;

/// Source of uniform deviates strictly inside (0, 1).
pub trait UniformSource {
    /// Next deviate in (0, 1).
    fn uniform(&mut self) -> f64;
}

impl<R: Rng + ?Sized> UniformSource for R {
    #[inline]
    fn uniform(&mut self) -> f64 {
        Open01.sample(self)
    }
}

/// Build the generator for run stream `stream` of `seed`.
pub fn seeded_rng(seed: u64, stream: u64) -> SimRng {
    let mut r = SimRng::seed_from_u64(seed);
    r.set_stream(stream);
    r
}

/// Fresh seed from the thread-local OS-seeded generator.
pub fn entropy_seed() -> u64 {
    rng().random()
}

/// Gaussian deviate N(mu, sigma^2) by Box-Muller.
///
/// Consumes exactly two uniform draws per call; the paired sine output is discarded.
pub fn gaussian<S: UniformSource + ?Sized>(source: &mut S, mu: f64, sigma: f64) -> f64 {
    let u1 = source.uniform();
    let u2 = source.uniform();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * sigma + mu
}

/// Replays a fixed sequence of uniform values, cycling when exhausted.
///
/// A test double for driving the engine through exact event sequences. It does
/// not enforce the open-interval contract of [`UniformSource`]: values are
/// replayed as given (0.0 included), and an empty script yields 0.5 forever.
#[derive(Debug, Clone)]
pub struct Scripted {
    values: Vec<f64>,
    cursor: usize,
}

impl Scripted {
    /// Replay `values` in order, starting over at the end.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// Number of values consumed so far.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for Scripted {
    fn uniform(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.5;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v
    }
}
