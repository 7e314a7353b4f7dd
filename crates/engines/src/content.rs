//! Content engine - item-to-item similarity over book titles
//!
//! "Readers who liked this title might like titles that read alike"
//!
//! ## Algorithm
//! 1. One document per item index: the title from metadata, or "" when the
//!    item has no metadata row or no title
//! 2. TF-IDF vectorize the documents (see `text`)
//! 3. Pairwise cosine over the unit vectors into a `SimilarityMatrix`
//! 4. Queries read one row, drop the query item and keep the best `top_n`

use crate::similarity::SimilarityMatrix;
use crate::text::TfidfVectorizer;
use data_loader::{InteractionRepository, ItemIndex, UnknownEntity};
use pipeline::{rank_top_n, Candidate, Recommendation, Strategy};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Content engine settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Remove English stop words before weighting
    pub stop_words: bool,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self { stop_words: true }
    }
}

impl ContentConfig {
    /// Configure stop-word removal (default: true)
    pub fn with_stop_words(mut self, stop_words: bool) -> Self {
        self.stop_words = stop_words;
        self
    }
}

/// Title similarity engine over every item of the snapshot
pub struct ContentEngine {
    repo: Arc<InteractionRepository>,
    similarity: SimilarityMatrix,
    /// Exact title -> first item index carrying it
    title_index: HashMap<String, ItemIndex>,
    config: ContentConfig,
}

impl ContentEngine {
    #[instrument(skip_all, fields(items = repo.num_items()))]
    pub fn build(repo: Arc<InteractionRepository>, config: &ContentConfig) -> Self {
        let documents: Vec<&str> = (0..repo.num_items())
            .map(|item| repo.metadata_at(item).map(|m| m.title_or_empty()).unwrap_or(""))
            .collect();

        let mut title_index = HashMap::new();
        for (item, title) in documents.iter().enumerate() {
            if !title.is_empty() {
                title_index.entry(title.to_string()).or_insert(item);
            }
        }

        let (vectorizer, vectors) =
            TfidfVectorizer::fit_transform_with(&documents, config.stop_words);
        debug!(
            "Vectorized {} titles over {} terms",
            documents.len(),
            vectorizer.vocabulary_len()
        );

        let similarity = SimilarityMatrix::cosine(&vectors);
        info!("Content engine ready: {} items", similarity.len());

        Self {
            repo,
            similarity,
            title_index,
            config: config.clone(),
        }
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// The `top_n` items whose titles are most similar to `item_id`'s.
    ///
    /// Scores are non-increasing, ties come back in ascending item index, and
    /// the query item is never part of the result. Items sharing no term with
    /// the query still qualify with score 0.
    #[instrument(skip(self))]
    pub fn similar_items(
        &self,
        item_id: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, UnknownEntity> {
        let item = self.repo.item_index(item_id)?;
        Ok(self.similar_to_index(item, top_n))
    }

    /// Same as `similar_items`, keyed by an exact title.
    ///
    /// When several items share the title, the first one in item order is
    /// the query.
    #[instrument(skip(self))]
    pub fn similar_to_title(
        &self,
        title: &str,
        top_n: usize,
    ) -> Result<Vec<Recommendation>, UnknownEntity> {
        let item = *self
            .title_index
            .get(title)
            .ok_or_else(|| UnknownEntity::title(title))?;
        Ok(self.similar_to_index(item, top_n))
    }

    /// Similarity between two items; symmetric, 1.0 on the diagonal
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32, UnknownEntity> {
        let a = self.repo.item_index(a)?;
        let b = self.repo.item_index(b)?;
        Ok(self.similarity.get(a, b))
    }

    pub fn matrix(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    fn similar_to_index(&self, item: ItemIndex, top_n: usize) -> Vec<Recommendation> {
        let candidates: Vec<Candidate> = self
            .similarity
            .row(item)
            .into_iter()
            .enumerate()
            .filter(|&(other, _)| other != item)
            .map(|(other, score)| Candidate::new(other, Strategy::Content, score))
            .collect();

        let ranked = rank_top_n(candidates, top_n);
        debug!("Content query on item {} kept {} candidates", item, ranked.len());
        Recommendation::resolve_all(&ranked, &self.repo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{EntityKind, Interaction, ItemMetadata};

    fn create_test_repo() -> Arc<InteractionRepository> {
        let interactions = vec![
            Interaction::new("u1", "b0", 8.0),
            Interaction::new("u1", "b1", 7.0),
            Interaction::new("u2", "b2", 9.0),
            Interaction::new("u2", "b3", 6.0),
            Interaction::new("u3", "b4", 5.0),
            Interaction::new("u3", "b5", 5.0),
        ];
        let metadata = vec![
            ItemMetadata::new("b0", "Harry Potter and the Chamber of Secrets", "J. K. Rowling"),
            ItemMetadata::new("b1", "Harry Potter and the Goblet of Fire", "J. K. Rowling"),
            ItemMetadata::new("b2", "Pride and Prejudice", "Jane Austen"),
            ItemMetadata::new("b3", "Pride and Prejudice", "Jane Austen"),
            ItemMetadata::new("b4", "Secrets of the Goblet", "Anon"),
            // b5 has no metadata row and becomes an empty document
        ];
        Arc::new(InteractionRepository::new(interactions, metadata))
    }

    fn engine() -> ContentEngine {
        ContentEngine::build(create_test_repo(), &ContentConfig::default())
    }

    #[test]
    fn test_identical_titles_score_one() {
        let engine = engine();
        let results = engine.similar_items("b2", 3).unwrap();
        assert_eq!(results[0].item_id, "b3");
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert_eq!(results[0].title.as_deref(), Some("Pride and Prejudice"));
        assert_eq!(results[0].source, Strategy::Content);
    }

    #[test]
    fn test_query_item_excluded_and_scores_non_increasing() {
        let engine = engine();
        for item_id in ["b0", "b1", "b2", "b3", "b4", "b5"] {
            let results = engine.similar_items(item_id, 10).unwrap();
            assert_eq!(results.len(), 5);
            assert!(results.iter().all(|r| r.item_id != item_id));
            for pair in results.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn test_top_n_truncates() {
        let engine = engine();
        assert_eq!(engine.similar_items("b0", 2).unwrap().len(), 2);
        assert!(engine.similar_items("b0", 0).unwrap().is_empty());
    }

    #[test]
    fn test_zero_score_ties_in_index_order() {
        let engine = engine();
        // b5 shares nothing with anyone: every other item scores 0
        let results = engine.similar_items("b5", 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(ids, vec!["b0", "b1", "b2", "b3", "b4"]);
        assert!(results.iter().all(|r| r.score == 0.0));
        assert!(results.iter().all(|r| r.title.is_some()));
    }

    #[test]
    fn test_similarity_symmetry_and_diagonal() {
        let engine = engine();
        let ids = ["b0", "b1", "b2", "b3", "b4", "b5"];
        for a in ids {
            assert_eq!(engine.similarity(a, a).unwrap(), 1.0);
            for b in ids {
                assert_eq!(engine.similarity(a, b).unwrap(), engine.similarity(b, a).unwrap());
            }
        }
        assert!(engine.similarity("b0", "b1").unwrap() > engine.similarity("b0", "b2").unwrap());
    }

    #[test]
    fn test_similar_to_title() {
        let engine = engine();
        let by_title = engine
            .similar_to_title("Harry Potter and the Goblet of Fire", 2)
            .unwrap();
        assert_eq!(by_title, engine.similar_items("b1", 2).unwrap());

        let err = engine.similar_to_title("Dune", 2).unwrap_err();
        assert_eq!(err.kind, EntityKind::Title);
    }

    #[test]
    fn test_unknown_item() {
        let engine = engine();
        let err = engine.similar_items("nope", 5).unwrap_err();
        assert_eq!(err, UnknownEntity::item("nope"));
    }
}
