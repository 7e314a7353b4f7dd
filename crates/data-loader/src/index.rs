//! InteractionRepository construction.
//!
//! This module builds the snapshot from cleaned rows:
//! - Intern user and item ids into dense first-seen indices
//! - Deduplicate (user, item) pairs, last rating wins
//! - Build the per-user rated-items index
//! - Record the observed rating range

use crate::error::{DataLoadError, Result};
use crate::parser::{self, CleaningConfig};
use crate::types::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use tracing::{debug, info};

impl InteractionRepository {
    /// Build the repository from cleaned interactions and item metadata.
    ///
    /// ## Algorithm
    /// 1. Walk interactions in order, interning user and item ids
    /// 2. Keep one triple per (user, item) pair, overwriting its rating on repeats
    /// 3. Group triples per user and sort each group by item index
    /// 4. Index metadata by item id (a repeated id keeps the last row)
    pub fn new(interactions: Vec<Interaction>, metadata: Vec<ItemMetadata>) -> Self {
        let mut users = IdMapping::default();
        let mut items = IdMapping::default();

        let mut slots: HashMap<(UserIndex, ItemIndex), usize> =
            HashMap::with_capacity(interactions.len());
        let mut triples: Vec<(UserIndex, ItemIndex, f32)> = Vec::with_capacity(interactions.len());

        for interaction in &interactions {
            let user = users.intern(&interaction.user_id);
            let item = items.intern(&interaction.item_id);
            match slots.entry((user, item)) {
                Entry::Occupied(slot) => triples[*slot.get()].2 = interaction.rating,
                Entry::Vacant(slot) => {
                    slot.insert(triples.len());
                    triples.push((user, item, interaction.rating));
                }
            }
        }

        let duplicates = interactions.len() - triples.len();
        if duplicates > 0 {
            debug!("Collapsed {} duplicate (user, item) ratings", duplicates);
        }

        let rating_range = triples.iter().fold(None, |range, &(_, _, rating)| match range {
            None => Some((rating, rating)),
            Some((lo, hi)) => Some((f32::min(lo, rating), f32::max(hi, rating))),
        });

        let mut user_ratings: Vec<Vec<(ItemIndex, f32)>> = vec![Vec::new(); users.len()];
        for &(user, item, rating) in &triples {
            user_ratings[user].push((item, rating));
        }
        user_ratings
            .par_iter_mut()
            .for_each(|ratings| ratings.sort_unstable_by_key(|&(item, _)| item));

        let metadata: HashMap<ItemId, ItemMetadata> = metadata
            .into_iter()
            .map(|meta| (meta.item_id.clone(), meta))
            .collect();

        debug!(
            "Built repository: {} users, {} items, {} interactions, {} metadata rows",
            users.len(),
            items.len(),
            triples.len(),
            metadata.len()
        );

        Self {
            users,
            items,
            triples,
            user_ratings,
            metadata,
            rating_range,
        }
    }

    /// Load, clean and index the Book-Crossing dataset from a directory
    ///
    /// Expects `Ratings.csv` and `Books.csv` in `data_dir`. Both files are
    /// parsed in parallel, ratings are cleaned with `cleaning`, and metadata
    /// is restricted to items that survived cleaning.
    pub fn load_from_dir(data_dir: &Path, cleaning: &CleaningConfig) -> Result<Self> {
        info!("Loading Book-Crossing dataset from {:?}", data_dir);

        let ratings_path = data_dir.join("Ratings.csv");
        let books_path = data_dir.join("Books.csv");

        let (ratings, books) = rayon::join(
            || parser::parse_ratings(&ratings_path),
            || parser::parse_books(&books_path),
        );
        let ratings = ratings?;
        let books = books?;
        info!("Parsed {} ratings and {} books", ratings.len(), books.len());

        let interactions = parser::clean_interactions(ratings, cleaning);
        if interactions.is_empty() {
            return Err(DataLoadError::EmptyDataset(
                ratings_path.display().to_string(),
            ));
        }

        let rated: std::collections::HashSet<&str> =
            interactions.iter().map(|i| i.item_id.as_str()).collect();
        let books: Vec<ItemMetadata> = books
            .into_iter()
            .filter(|book| rated.contains(book.item_id.as_str()))
            .collect();

        let repository = Self::new(interactions, books);
        let (users, items, interactions) = repository.counts();
        info!(
            "Repository ready: {} users, {} items, {} interactions",
            users, items, interactions
        );
        Ok(repository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> InteractionRepository {
        InteractionRepository::new(
            vec![
                Interaction::new("u2", "b1", 8.0),
                Interaction::new("u1", "b2", 5.0),
                Interaction::new("u2", "b3", 9.0),
                Interaction::new("u1", "b1", 3.0),
                Interaction::new("u2", "b1", 10.0),
            ],
            vec![
                ItemMetadata::new("b1", "Dune", "Frank Herbert"),
                ItemMetadata::new("b2", "Emma", "Jane Austen"),
            ],
        )
    }

    #[test]
    fn test_first_seen_order() {
        let repo = sample();
        assert_eq!(repo.user_ids(), &["u2".to_string(), "u1".to_string()]);
        assert_eq!(
            repo.item_ids(),
            &["b1".to_string(), "b2".to_string(), "b3".to_string()]
        );
    }

    #[test]
    fn test_duplicate_pair_last_value_wins() {
        let repo = sample();
        let (_, _, interactions) = repo.counts();
        assert_eq!(interactions, 4);

        let u2 = repo.user_index("u2").unwrap();
        let b1 = repo.item_index("b1").unwrap();
        let rating = repo
            .rated_item_indices(u2)
            .iter()
            .find(|&&(item, _)| item == b1)
            .map(|&(_, r)| r);
        assert_eq!(rating, Some(10.0));
    }

    #[test]
    fn test_rating_range() {
        let repo = sample();
        assert_eq!(repo.rating_range(), Some((3.0, 10.0)));
        assert_eq!(InteractionRepository::default().rating_range(), None);
    }

    #[test]
    fn test_rated_items_sorted_and_unknown() {
        let repo = sample();
        let u1 = repo.user_index("u1").unwrap();
        let items: Vec<ItemIndex> = repo.rated_item_indices(u1).iter().map(|&(i, _)| i).collect();
        assert_eq!(items, vec![0, 1]);

        let mut rated = repo.rated_items("u1").unwrap();
        rated.sort();
        assert_eq!(rated, vec!["b1", "b2"]);

        let err = repo.rated_items("nobody").unwrap_err();
        assert_eq!(err, crate::UnknownEntity::user("nobody"));
    }

    #[test]
    fn test_mapping_round_trip() {
        let repo = sample();
        for id in repo.user_ids() {
            let idx = repo.users().encode(id).unwrap();
            assert_eq!(repo.users().decode(idx), Some(id.as_str()));
        }
        for id in repo.item_ids() {
            let idx = repo.items().encode(id).unwrap();
            assert_eq!(repo.items().decode(idx), Some(id.as_str()));
        }
    }

    #[test]
    fn test_metadata_lookup() {
        let repo = sample();
        assert_eq!(
            repo.metadata("b1").and_then(|m| m.title.as_deref()),
            Some("Dune")
        );
        assert!(repo.metadata("b3").is_none());
        assert!(repo.metadata_at(2).is_none());
    }
}
