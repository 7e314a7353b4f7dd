//! Training hyperparameters.

use serde::Deserialize;

/// Hyperparameters of the latent-factor trainer
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Width of user and item embeddings
    pub embedding_dim: usize,
    /// Upper bound on passes over the training split
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    /// L2 penalty on embedding weights (biases are not penalized)
    pub l2: f32,
    /// Epochs without a better validation RMSE before stopping
    pub patience: usize,
    /// Fraction of shuffled interactions held out for validation
    pub validation_split: f32,
    /// Seeds initialization and every shuffle
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            embedding_dim: 50,
            epochs: 100,
            batch_size: 8,
            learning_rate: 0.001,
            l2: 1e-6,
            patience: 5,
            validation_split: 0.2,
            seed: 42,
        }
    }
}

impl TrainingConfig {
    /// Configure the embedding width (default: 50)
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Configure the maximum number of epochs (default: 100)
    pub fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Configure the mini-batch size (default: 8)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Configure the Adam learning rate (default: 0.001)
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Configure the L2 penalty (default: 1e-6)
    pub fn with_l2(mut self, l2: f32) -> Self {
        self.l2 = l2;
        self
    }

    /// Configure early-stopping patience (default: 5)
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }

    /// Configure the validation fraction (default: 0.2)
    pub fn with_validation_split(mut self, split: f32) -> Self {
        self.validation_split = split;
        self
    }

    /// Configure the random seed (default: 42)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
