//! Embedding tables and their initialization.

use rand::Rng;
use rand::rngs::StdRng;

/// Samples beyond this many standard deviations are redrawn
const TRUNCATION: f32 = 2.0;

/// Std of a standard normal truncated at two standard deviations
const TRUNCATED_STD: f32 = 0.879_625_66;

/// Bias entries start uniform in [-BIAS_INIT, BIAS_INIT]
const BIAS_INIT: f32 = 0.05;

/// Dense index -> `dim`-vector plus a scalar bias, stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingTable {
    rows: usize,
    dim: usize,
    pub(crate) weights: Vec<f32>,
    pub(crate) bias: Vec<f32>,
}

impl EmbeddingTable {
    /// He-normal weights (std = sqrt(2 / rows) after truncation at two
    /// standard deviations) and small uniform biases
    pub fn he_normal(rows: usize, dim: usize, rng: &mut StdRng) -> Self {
        let std = (2.0 / rows.max(1) as f32).sqrt() / TRUNCATED_STD;
        let weights = (0..rows * dim)
            .map(|_| truncated_normal(rng) * std)
            .collect();
        let bias = (0..rows)
            .map(|_| rng.random_range(-BIAS_INIT..=BIAS_INIT))
            .collect();
        Self { rows, dim, weights, bias }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embedding vector of `row`
    pub fn vector(&self, row: usize) -> &[f32] {
        &self.weights[row * self.dim..(row + 1) * self.dim]
    }

    pub fn bias(&self, row: usize) -> f32 {
        self.bias[row]
    }

    pub fn is_finite(&self) -> bool {
        self.weights.iter().chain(&self.bias).all(|w| w.is_finite())
    }
}

/// Standard normal draw via Box-Muller, redrawn until within `TRUNCATION`
fn truncated_normal(rng: &mut StdRng) -> f32 {
    loop {
        // random() is in [0, 1); flip it so ln() never sees 0
        let u1 = 1.0 - rng.random::<f32>();
        let u2 = rng.random::<f32>();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f32::consts::PI * u2).cos();
        if z.abs() <= TRUNCATION {
            return z;
        }
    }
}
