//! Training failures.
//!
//! None of these carry a model: a failed fit never hands back weights.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrainingError {
    /// Loss or a validation metric stopped being finite
    #[error("Training diverged at epoch {epoch}: loss is no longer finite")]
    Diverged { epoch: usize },

    /// The best checkpoint never beat the untrained model
    #[error("Training never improved on the untrained model (best val RMSE {best:.4}, baseline {baseline:.4})")]
    NoImprovement { best: f32, baseline: f32 },

    /// A stop was requested before the first checkpoint existed
    #[error("Training was cancelled before the first epoch completed")]
    Cancelled,

    #[error("No interactions to train on")]
    EmptyDataset,
}
