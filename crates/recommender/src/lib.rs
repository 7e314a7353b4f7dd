//! Facade crate for the book recommendation engines.
//!
//! `RecommendationFacade` owns the content, neighborhood and latent engines
//! built from one `InteractionRepository` and routes each query by
//! `Strategy`.

pub mod config;
pub mod error;
pub mod facade;

pub use config::RecommenderConfig;
pub use error::{ConfigError, RecommendError};
pub use facade::{RecommendOutcome, RecommendationFacade};
pub use pipeline::Strategy;
