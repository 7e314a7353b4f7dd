//! Adam with row-sparse updates.
//!
//! A mini-batch only touches the embedding rows of the users and items it
//! contains, so moments and weights are updated for those rows alone. The
//! step counter is global, which keeps bias correction identical to dense
//! Adam for a row that appears in every batch.

use std::collections::BTreeMap;

/// Moment estimates for one parameter buffer
#[derive(Debug, Clone)]
pub struct Moments {
    width: usize,
    m: Vec<f32>,
    v: Vec<f32>,
}

impl Moments {
    /// Zeroed moments for `rows` rows of `width` parameters
    pub fn zeros(rows: usize, width: usize) -> Self {
        Self {
            width,
            m: vec![0.0; rows * width],
            v: vec![0.0; rows * width],
        }
    }
}

/// Row gradients of one parameter buffer, keyed by row
pub type RowGradients = BTreeMap<usize, Vec<f32>>;

#[derive(Debug, Clone)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    t: i32,
}

impl Adam {
    pub fn new(learning_rate: f32) -> Self {
        Self {
            learning_rate,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            t: 0,
        }
    }

    /// Advance the step counter; call once per mini-batch
    pub fn tick(&mut self) {
        self.t += 1;
    }

    pub fn steps(&self) -> i32 {
        self.t
    }

    /// Apply one Adam update to the rows of `params` named in `grads`
    pub fn update(&self, params: &mut [f32], moments: &mut Moments, grads: &RowGradients) {
        let t = self.t.max(1);
        let lr_t = self.learning_rate * (1.0 - self.beta2.powi(t)).sqrt()
            / (1.0 - self.beta1.powi(t));
        let width = moments.width;

        for (&row, grad) in grads {
            let start = row * width;
            for (k, &g) in grad.iter().enumerate() {
                let idx = start + k;
                moments.m[idx] = self.beta1 * moments.m[idx] + (1.0 - self.beta1) * g;
                moments.v[idx] = self.beta2 * moments.v[idx] + (1.0 - self.beta2) * g * g;
                params[idx] -= lr_t * moments.m[idx] / (moments.v[idx].sqrt() + self.epsilon);
            }
        }
    }
}
