//! The latent-factor model: two embedding tables and a sigmoid.

use crate::embedding::EmbeddingTable;
use data_loader::{ItemIndex, UserIndex};
use rand::rngs::StdRng;

/// Predictions are kept this far away from 0 and 1
pub const PREDICTION_EPSILON: f32 = 1e-7;

pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid clamped into the open interval (0, 1)
pub fn affinity(logit: f32) -> f32 {
    sigmoid(logit).clamp(PREDICTION_EPSILON, 1.0 - PREDICTION_EPSILON)
}

/// affinity(u, i) = sigmoid(dot(user_u, item_i) + bias_u + bias_i)
#[derive(Debug, Clone, PartialEq)]
pub struct LatentFactorModel {
    pub(crate) users: EmbeddingTable,
    pub(crate) items: EmbeddingTable,
}

impl LatentFactorModel {
    pub fn init(num_users: usize, num_items: usize, dim: usize, rng: &mut StdRng) -> Self {
        Self {
            users: EmbeddingTable::he_normal(num_users, dim, rng),
            items: EmbeddingTable::he_normal(num_items, dim, rng),
        }
    }

    pub fn num_users(&self) -> usize {
        self.users.rows()
    }

    pub fn num_items(&self) -> usize {
        self.items.rows()
    }

    pub fn dim(&self) -> usize {
        self.users.dim()
    }

    pub fn user_table(&self) -> &EmbeddingTable {
        &self.users
    }

    pub fn item_table(&self) -> &EmbeddingTable {
        &self.items
    }

    /// Raw score before the sigmoid
    pub fn logit(&self, user: UserIndex, item: ItemIndex) -> f32 {
        let dot: f32 = self
            .users
            .vector(user)
            .iter()
            .zip(self.items.vector(item))
            .map(|(u, i)| u * i)
            .sum();
        dot + self.users.bias(user) + self.items.bias(item)
    }

    /// Predicted affinity in (0, 1); panics on out-of-range indices
    pub fn predict(&self, user: UserIndex, item: ItemIndex) -> f32 {
        affinity(self.logit(user, item))
    }

    pub fn is_finite(&self) -> bool {
        self.users.is_finite() && self.items.is_finite()
    }
}
