//! Errors surfaced by the facade.

use data_loader::UnknownEntity;
use latent::TrainingError;
use thiserror::Error;

/// Why a recommendation query could not be answered
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecommendError {
    /// The subject id is not part of the snapshot (cold start)
    #[error(transparent)]
    UnknownEntity(#[from] UnknownEntity),

    /// The latent model failed to train, so latent queries cannot be served
    #[error("Latent model unavailable: {0}")]
    TrainingDivergence(TrainingError),

    /// An engine build task panicked or was cancelled
    #[error("Engine build task failed: {0}")]
    BuildTask(String),
}

/// Problems reading a configuration file
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
