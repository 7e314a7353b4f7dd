//! Neighborhood engine - user-based collaborative filtering
//!
//! "Readers who rate like you also liked these books"
//!
//! ## Algorithm
//! 1. Each user is a sparse row of their ratings (unrated items count as 0)
//! 2. User-user cosine similarity into a `SimilarityMatrix`
//! 3. For a query, take the `neighbors` most similar other users
//! 4. Score every item a neighbor rated by the mean rating among the
//!    neighbors who rated it
//! 5. Drop items the user already rated, rank, truncate, then drop rows
//!    without metadata (so the result may be shorter than `top_n`)

use crate::similarity::{SimilarityMatrix, SparseVector};
use data_loader::{InteractionRepository, UnknownEntity, UserIndex};
use pipeline::filters::{AlreadyRatedFilter, KnownMetadataFilter};
use pipeline::{rank_top_n, Candidate, FilterPipeline, Recommendation, Strategy, UserContext};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Neighborhood engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NeighborhoodConfig {
    /// How many similar users contribute to a recommendation
    pub neighbors: usize,
}

impl Default for NeighborhoodConfig {
    fn default() -> Self {
        Self { neighbors: 5 }
    }
}

impl NeighborhoodConfig {
    /// Configure the neighborhood size (default: 5)
    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }
}

/// User-based collaborative filtering over the whole snapshot
pub struct NeighborhoodEngine {
    repo: Arc<InteractionRepository>,
    similarity: SimilarityMatrix,
    neighbors: usize,
}

impl NeighborhoodEngine {
    #[instrument(skip_all, fields(users = repo.num_users()))]
    pub fn build(repo: Arc<InteractionRepository>, config: &NeighborhoodConfig) -> Self {
        let rows: Vec<SparseVector> = (0..repo.num_users())
            .map(|user| repo.rated_item_indices(user).to_vec())
            .collect();
        let similarity = SimilarityMatrix::cosine(&rows);
        info!(
            "Neighborhood engine ready: {} users, {} neighbors per query",
            similarity.len(),
            config.neighbors
        );

        Self {
            repo,
            similarity,
            neighbors: config.neighbors,
        }
    }

    /// The `neighbors` users most similar to `user`, most similar first.
    ///
    /// Ties break on the ascending user index; the user itself is excluded.
    pub fn neighbors_of(&self, user: UserIndex) -> Vec<(UserIndex, f32)> {
        let mut others: Vec<(UserIndex, f32)> = self
            .similarity
            .row(user)
            .into_iter()
            .enumerate()
            .filter(|&(other, _)| other != user)
            .collect();
        others.sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        others.truncate(self.neighbors);
        others
    }

    /// Recommend up to `top_n` unrated items for `user_id`.
    ///
    /// An empty list is a valid answer: the neighbors may have rated nothing
    /// new, or nothing with a metadata row.
    #[instrument(skip(self))]
    pub fn recommend_for_user(
        &self,
        user_id: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, UnknownEntity> {
        let context = UserContext::build(&self.repo, user_id)?;
        let neighbors = self.neighbors_of(context.user);
        debug!("User {} has {} neighbors", user_id, neighbors.len());

        let candidates = self.mean_neighbor_ratings(&neighbors);
        let unseen = FilterPipeline::new()
            .add_filter(AlreadyRatedFilter)
            .apply(candidates, &context);

        let ranked = rank_top_n(unseen, top_n);
        let presentable = FilterPipeline::new()
            .add_filter(KnownMetadataFilter::new(self.repo.clone()))
            .apply(ranked, &context);

        Ok(Recommendation::resolve_all(&presentable, &self.repo))
    }

    /// Similarity between two users; symmetric, 1.0 on the diagonal
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32, UnknownEntity> {
        let a = self.repo.user_index(a)?;
        let b = self.repo.user_index(b)?;
        Ok(self.similarity.get(a, b))
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    fn mean_neighbor_ratings(&self, neighbors: &[(UserIndex, f32)]) -> Vec<Candidate> {
        let mut sums: BTreeMap<usize, (f32, u32)> = BTreeMap::new();
        for &(neighbor, _) in neighbors {
            for &(item, rating) in self.repo.rated_item_indices(neighbor) {
                let entry = sums.entry(item).or_insert((0.0, 0));
                entry.0 += rating;
                entry.1 += 1;
            }
        }

        sums.into_iter()
            .map(|(item, (sum, count))| {
                Candidate::new(item, Strategy::Neighborhood, sum / count as f32)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{Interaction, ItemMetadata};

    fn create_test_repo() -> Arc<InteractionRepository> {
        let interactions = vec![
            // target reader
            Interaction::new("u0", "b0", 8.0),
            Interaction::new("u0", "b1", 6.0),
            // close neighbor: same taste, plus b2 and b3
            Interaction::new("u1", "b0", 8.0),
            Interaction::new("u1", "b1", 6.0),
            Interaction::new("u1", "b2", 10.0),
            Interaction::new("u1", "b3", 4.0),
            // partial neighbor
            Interaction::new("u2", "b0", 5.0),
            Interaction::new("u2", "b2", 6.0),
            Interaction::new("u2", "b4", 9.0),
            // unrelated reader
            Interaction::new("u3", "b5", 7.0),
        ];
        let metadata = vec![
            ItemMetadata::new("b0", "Dune", "Frank Herbert"),
            ItemMetadata::new("b1", "Emma", "Jane Austen"),
            ItemMetadata::new("b2", "Persuasion", "Jane Austen"),
            ItemMetadata::new("b3", "Ulysses", "James Joyce"),
            // b4 has no metadata row
            ItemMetadata::new("b5", "Beloved", "Toni Morrison"),
        ];
        Arc::new(InteractionRepository::new(interactions, metadata))
    }

    fn engine(neighbors: usize) -> NeighborhoodEngine {
        NeighborhoodEngine::build(
            create_test_repo(),
            &NeighborhoodConfig::default().with_neighbors(neighbors),
        )
    }

    #[test]
    fn test_neighbors_ordering() {
        let engine = engine(5);
        let neighbors = engine.neighbors_of(0);
        let users: Vec<usize> = neighbors.iter().map(|&(u, _)| u).collect();
        assert_eq!(users, vec![1, 2, 3]);
        assert!(neighbors.windows(2).all(|w| w[0].1 >= w[1].1));
        assert_eq!(neighbors[2].1, 0.0);

        assert_eq!(self::engine(1).neighbors_of(0).len(), 1);
    }

    #[test]
    fn test_mean_over_neighbors_that_rated() {
        let engine = engine(2);
        let results = engine.recommend_for_user("u0", 10).unwrap();
        let ranked: Vec<(&str, f32)> = results
            .iter()
            .map(|r| (r.item_id.as_str(), r.score))
            .collect();
        // b2 = (10 + 6) / 2, b4 (9) has no metadata, b3 = 4
        assert_eq!(ranked, vec![("b2", 8.0), ("b3", 4.0)]);
        assert!(results.iter().all(|r| r.source == Strategy::Neighborhood));
    }

    #[test]
    fn test_never_returns_rated_items() {
        let engine = engine(3);
        for user_id in ["u0", "u1", "u2", "u3"] {
            let rated = engine.repo.rated_items(user_id).unwrap();
            let results = engine.recommend_for_user(user_id, 10).unwrap();
            assert!(results.iter().all(|r| !rated.contains(&r.item_id.as_str())));
        }
    }

    #[test]
    fn test_metadata_drop_happens_after_truncation() {
        let engine = engine(2);
        // top 2 before the metadata filter is b2 and b4; b4 is dropped afterwards
        let results = engine.recommend_for_user("u0", 2).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].item_id, "b2");
    }

    #[test]
    fn test_user_who_rated_everything_gets_nothing() {
        let repo = Arc::new(InteractionRepository::new(
            vec![
                Interaction::new("a", "x", 5.0),
                Interaction::new("a", "y", 6.0),
                Interaction::new("b", "x", 7.0),
            ],
            vec![
                ItemMetadata::new("x", "Dune", "Frank Herbert"),
                ItemMetadata::new("y", "Emma", "Jane Austen"),
            ],
        ));
        let engine = NeighborhoodEngine::build(repo, &NeighborhoodConfig::default());
        assert!(engine.recommend_for_user("a", 5).unwrap().is_empty());
    }

    #[test]
    fn test_similarity_symmetry() {
        let engine = engine(5);
        let ids = ["u0", "u1", "u2", "u3"];
        for a in ids {
            assert_eq!(engine.similarity(a, a).unwrap(), 1.0);
            for b in ids {
                assert_eq!(engine.similarity(a, b).unwrap(), engine.similarity(b, a).unwrap());
            }
        }
    }

    #[test]
    fn test_unknown_user() {
        let engine = engine(5);
        let err = engine.recommend_for_user("ghost", 5).unwrap_err();
        assert_eq!(err, UnknownEntity::user("ghost"));
    }
}
