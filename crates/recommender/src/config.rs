//! Facade configuration, one section per engine.
//!
//! Every section and field is optional in the JSON form; missing values
//! take the defaults of the corresponding engine.
//!
//! ```json
//! {
//!   "neighborhood": { "neighbors": 10 },
//!   "training": { "embedding_dim": 32, "epochs": 20 }
//! }
//! ```

use crate::error::ConfigError;
use data_loader::CleaningConfig;
use engines::{ContentConfig, NeighborhoodConfig};
use latent::TrainingConfig;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub cleaning: CleaningConfig,
    pub content: ContentConfig,
    pub neighborhood: NeighborhoodConfig,
    pub training: TrainingConfig,
}

impl RecommenderConfig {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_training(mut self, training: TrainingConfig) -> Self {
        self.training = training;
        self
    }

    pub fn with_neighborhood(mut self, neighborhood: NeighborhoodConfig) -> Self {
        self.neighborhood = neighborhood;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RecommenderConfig::from_json_str(
            r#"{ "neighborhood": { "neighbors": 10 }, "training": { "epochs": 20 } }"#,
        )
        .unwrap();
        assert_eq!(config.neighborhood.neighbors, 10);
        assert_eq!(config.training.epochs, 20);
        assert_eq!(config.training.embedding_dim, 50);
        assert_eq!(config.cleaning.min_user_ratings, 3);
        assert!(config.content.stop_words);
    }

    #[test]
    fn test_empty_object_is_default() {
        let config = RecommenderConfig::from_json_str("{}").unwrap();
        assert_eq!(config.training, TrainingConfig::default());
    }

    #[test]
    fn test_from_json_file() {
        let path = std::env::temp_dir().join(format!("book-recs-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "training": { "seed": 7 } }"#).unwrap();
        let config = RecommenderConfig::from_json_file(&path).unwrap();
        assert_eq!(config.training.seed, 7);
        std::fs::remove_file(&path).unwrap();

        let err = RecommenderConfig::from_json_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_json() {
        assert!(RecommenderConfig::from_json_str(r#"{ "training": { "epochs": "many" } }"#).is_err());
    }
}
