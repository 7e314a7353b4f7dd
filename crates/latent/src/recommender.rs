//! Serving top-N predictions from a trained model.

use crate::metrics::{self, Sample};
use crate::model::LatentFactorModel;
use crate::trainer::TrainingReport;
use data_loader::{Interaction, InteractionRepository, UnknownEntity};
use pipeline::filters::AlreadyRatedFilter;
use pipeline::{rank_top_n, Candidate, Filter, Recommendation, Strategy, UserContext};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Frozen latent model bound to the snapshot it was trained on
pub struct LatentRecommender {
    repo: Arc<InteractionRepository>,
    report: TrainingReport,
}

impl LatentRecommender {
    pub fn new(repo: Arc<InteractionRepository>, report: TrainingReport) -> Self {
        Self { repo, report }
    }

    pub fn model(&self) -> &LatentFactorModel {
        &self.report.model
    }

    pub fn report(&self) -> &TrainingReport {
        &self.report
    }

    /// Predicted affinity of a user for an item, in (0, 1)
    pub fn predict(&self, user_id: &str, item_id: &str) -> Result<f32, UnknownEntity> {
        let user = self.repo.user_index(user_id)?;
        let item = self.repo.item_index(item_id)?;
        Ok(self.report.model.predict(user, item))
    }

    /// Score every item the user has not rated and keep the best `top_n`
    #[instrument(skip(self))]
    pub fn predict_for_user(
        &self,
        user_id: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, UnknownEntity> {
        let context = UserContext::build(&self.repo, user_id)?;
        let model = &self.report.model;

        let candidates: Vec<Candidate> = (0..self.repo.num_items())
            .map(|item| Candidate::new(item, Strategy::Latent, model.predict(context.user, item)))
            .collect();
        let unseen = AlreadyRatedFilter.apply(candidates, &context);
        debug!("Scored {} unrated items for user {}", unseen.len(), user_id);

        let ranked = rank_top_n(unseen, top_n);
        Ok(Recommendation::resolve_all(&ranked, &self.repo))
    }

    /// RMSE of the model on labelled interactions, with ratings normalized
    /// the same way as during training
    pub fn evaluate_rmse(&self, labelled: &[Interaction]) -> Result<f32, UnknownEntity> {
        let samples = labelled
            .iter()
            .map(|row| {
                Ok(Sample {
                    user: self.repo.user_index(&row.user_id)?,
                    item: self.repo.item_index(&row.item_id)?,
                    target: self.report.scaler.normalize(row.rating),
                })
            })
            .collect::<Result<Vec<_>, UnknownEntity>>()?;
        Ok(metrics::rmse(&self.report.model, &samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingConfig;
    use crate::trainer::Trainer;
    use data_loader::ItemMetadata;

    fn trained() -> LatentRecommender {
        let mut interactions = Vec::new();
        for user in 0..10 {
            for item in 0..6 {
                // every user skips one item so there is something to recommend
                if (user + item) % 6 != 0 {
                    interactions.push(Interaction::new(
                        format!("u{user}"),
                        format!("b{item}"),
                        (item + 1) as f32,
                    ));
                }
            }
        }
        let metadata = vec![ItemMetadata::new("b0", "Dune", "Frank Herbert")];
        let repo = Arc::new(InteractionRepository::new(interactions, metadata));
        let config = TrainingConfig::default()
            .with_embedding_dim(4)
            .with_learning_rate(0.05);
        let report = Trainer::new(config).fit(&repo).unwrap();
        LatentRecommender::new(repo, report)
    }

    #[test]
    fn test_predict_for_user_skips_rated_items() {
        let recommender = trained();
        let results = recommender.predict_for_user("u1", 10).unwrap();
        // u1 skipped only b5
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, "b5");
        assert_eq!(results[0].source, Strategy::Latent);
        assert!(results[0].score > 0.0 && results[0].score < 1.0);
    }

    #[test]
    fn test_metadata_joined_when_present() {
        let recommender = trained();
        // u0 skipped b0, the only item with metadata
        let results = recommender.predict_for_user("u0", 3).unwrap();
        assert_eq!(results[0].item_id, "b0");
        assert_eq!(results[0].title.as_deref(), Some("Dune"));
    }

    #[test]
    fn test_evaluate_rmse_beats_baseline() {
        let recommender = trained();
        let labelled: Vec<Interaction> = (0..6)
            .map(|item| Interaction::new("u3", format!("b{item}"), (item + 1) as f32))
            .collect();
        let rmse = recommender.evaluate_rmse(&labelled).unwrap();
        assert!(rmse < recommender.report().baseline_rmse);

        let err = recommender
            .evaluate_rmse(&[Interaction::new("nobody", "b1", 3.0)])
            .unwrap_err();
        assert_eq!(err, UnknownEntity::user("nobody"));
    }

    #[test]
    fn test_unknown_user() {
        let recommender = trained();
        assert_eq!(
            recommender.predict_for_user("ghost", 5).unwrap_err(),
            UnknownEntity::user("ghost")
        );
        assert!(recommender.predict("u1", "missing").is_err());
    }
}
