//! # Latent Crate
//!
//! Learns user and item embeddings whose sigmoid dot product (plus biases)
//! predicts normalized ratings, then serves top-N unrated items per user.
//!
//! ## Components
//!
//! - **config**: `TrainingConfig` hyperparameters
//! - **embedding** / **model**: embedding tables and `LatentFactorModel`
//! - **optimizer**: row-sparse Adam
//! - **metrics**: BCE and RMSE over labelled samples
//! - **trainer**: `Trainer::fit` with early stopping and `TrainingReport`
//! - **recommender**: `LatentRecommender` queries over a trained model
//! - **stop**: `StopSignal`, the cooperative cancel flag
//!
//! ## Example Usage
//! ```ignore
//! use latent::{LatentRecommender, StopSignal, Trainer, TrainingConfig};
//!
//! let stop = StopSignal::new();
//! let report = Trainer::new(TrainingConfig::default())
//!     .with_stop_signal(stop.clone())
//!     .fit(&repo)?;
//! let recommender = LatentRecommender::new(repo.clone(), report);
//! let picks = recommender.predict_for_user("276747", 10)?;
//! ```

pub mod config;
pub mod embedding;
pub mod error;
pub mod metrics;
pub mod model;
pub mod optimizer;
pub mod recommender;
pub mod scaler;
pub mod stop;
pub mod trainer;

pub use config::TrainingConfig;
pub use error::TrainingError;
pub use model::LatentFactorModel;
pub use recommender::LatentRecommender;
pub use scaler::TargetScaler;
pub use stop::StopSignal;
pub use trainer::{EpochStats, Trainer, TrainingReport};
