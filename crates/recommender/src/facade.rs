//! # Recommendation Facade
//!
//! Builds the three engines from one snapshot and routes queries to them:
//! 1. Content: subject is an item id, answers "books with similar titles"
//! 2. Neighborhood: subject is a user id, answers "what similar readers liked"
//! 3. Latent: subject is a user id, answers "what the trained model predicts"
//!
//! Engines are built concurrently on the blocking pool. A latent training
//! failure is kept and reported on latent queries only; the other two
//! engines keep serving.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::config::RecommenderConfig;
use crate::error::RecommendError;
use data_loader::InteractionRepository;
use engines::{ContentEngine, NeighborhoodEngine};
use latent::{LatentRecommender, StopSignal, Trainer, TrainingError, TrainingReport};
use pipeline::{Recommendation, Strategy};

/// Answer to a recommendation query
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "items", rename_all = "snake_case")]
pub enum RecommendOutcome {
    /// Best first, at most `top_n` entries
    Ranked(Vec<Recommendation>),
    /// The subject is known but nothing is left to recommend
    InsufficientData,
}

impl RecommendOutcome {
    /// `ranked` was queried with at least one slot, so emptiness means no
    /// eligible candidate; it is then cut down to `top_n`
    fn from_ranked(mut ranked: Vec<Recommendation>, top_n: usize) -> Self {
        if ranked.is_empty() {
            RecommendOutcome::InsufficientData
        } else {
            ranked.truncate(top_n);
            RecommendOutcome::Ranked(ranked)
        }
    }

    /// Ranked entries, empty for `InsufficientData`
    pub fn items(&self) -> &[Recommendation] {
        match self {
            RecommendOutcome::Ranked(items) => items,
            RecommendOutcome::InsufficientData => &[],
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, RecommendOutcome::InsufficientData)
    }
}

/// Single entry point over the content, neighborhood and latent engines
pub struct RecommendationFacade {
    repo: Arc<InteractionRepository>,
    content: ContentEngine,
    neighborhood: NeighborhoodEngine,
    latent: Result<LatentRecommender, TrainingError>,
}

impl RecommendationFacade {
    /// Build all three engines in parallel
    ///
    /// `stop` is handed to the latent trainer; raising it ends training after
    /// the current epoch and keeps the best weights seen so far.
    #[instrument(skip_all)]
    pub async fn build(
        repo: Arc<InteractionRepository>,
        config: &RecommenderConfig,
        stop: StopSignal,
    ) -> Result<Self, RecommendError> {
        let start_time = Instant::now();

        let (content, neighborhood, latent) = tokio::join!(
            tokio::task::spawn_blocking({
                let repo = repo.clone();
                let config = config.content.clone();
                move || ContentEngine::build(repo, &config)
            }),
            tokio::task::spawn_blocking({
                let repo = repo.clone();
                let config = config.neighborhood.clone();
                move || NeighborhoodEngine::build(repo, &config)
            }),
            tokio::task::spawn_blocking({
                let repo = repo.clone();
                let trainer = Trainer::new(config.training.clone()).with_stop_signal(stop);
                move || {
                    trainer
                        .fit(&repo)
                        .map(|report| LatentRecommender::new(repo.clone(), report))
                }
            }),
        );

        let content = content.map_err(|e| RecommendError::BuildTask(e.to_string()))?;
        let neighborhood = neighborhood.map_err(|e| RecommendError::BuildTask(e.to_string()))?;
        let latent = latent.map_err(|e| RecommendError::BuildTask(e.to_string()))?;

        if let Err(err) = &latent {
            warn!("Latent engine unavailable: {}", err);
        }
        info!("All engines built in {:.2?}", start_time.elapsed());

        Ok(Self {
            repo,
            content,
            neighborhood,
            latent,
        })
    }

    /// Route a query to the engine for `strategy`.
    ///
    /// `subject` is an item id for `Content` and a user id otherwise.
    /// `top_n == 0` answers `Ranked` with no entries as long as something
    /// could have been recommended.
    #[instrument(skip(self))]
    pub fn recommend(
        &self,
        strategy: Strategy,
        subject: &str,
        top_n: usize,
    ) -> Result<RecommendOutcome, RecommendError> {
        let slots = top_n.max(1);
        let ranked = match strategy {
            Strategy::Content => self.content.similar_items(subject, slots)?,
            Strategy::Neighborhood => self.neighborhood.recommend_for_user(subject, slots)?,
            Strategy::Latent => {
                // an unknown user is reported as such even without a model
                self.repo.user_index(subject)?;
                match &self.latent {
                    Ok(latent) => latent.predict_for_user(subject, slots)?,
                    Err(err) => return Err(RecommendError::TrainingDivergence(err.clone())),
                }
            }
        };
        Ok(RecommendOutcome::from_ranked(ranked, top_n))
    }

    /// Content query keyed by an exact title
    pub fn similar_to_title(
        &self,
        title: &str,
        top_n: usize,
    ) -> Result<RecommendOutcome, RecommendError> {
        let ranked = self.content.similar_to_title(title, top_n.max(1))?;
        Ok(RecommendOutcome::from_ranked(ranked, top_n))
    }

    /// Training outcome of the latent engine
    pub fn latent_report(&self) -> Result<&TrainingReport, &TrainingError> {
        self.latent.as_ref().map(|latent| latent.report())
    }

    pub fn repository(&self) -> &Arc<InteractionRepository> {
        &self.repo
    }

    pub fn content(&self) -> &ContentEngine {
        &self.content
    }

    pub fn neighborhood(&self) -> &NeighborhoodEngine {
        &self.neighborhood
    }

    pub fn latent(&self) -> Option<&LatentRecommender> {
        self.latent.as_ref().ok()
    }
}
