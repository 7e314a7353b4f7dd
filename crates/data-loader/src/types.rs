//! Core domain types for the book interaction snapshot.
//!
//! This module defines the fundamental data structures shared by every engine:
//! - Type aliases for the opaque external identifiers
//! - `Interaction` and `ItemMetadata` rows as handed over by ingestion
//! - `IdMapping`, the dense-index bijection used for matrix axes
//! - `InteractionRepository`, the immutable snapshot itself

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::UnknownEntity;

// =============================================================================
// Type Aliases
// =============================================================================

/// Opaque external user identifier (the Book-Crossing `User-ID`)
pub type UserId = String;

/// Opaque external item identifier (an ISBN in the Book-Crossing data)
pub type ItemId = String;

/// Dense zero-based index into the user axis
pub type UserIndex = usize;

/// Dense zero-based index into the item axis
pub type ItemIndex = usize;

// =============================================================================
// Input rows
// =============================================================================

/// A single explicit rating from a user for an item.
///
/// Ratings of 0 ("no opinion") are removed upstream and never reach here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: UserId,
    pub item_id: ItemId,
    pub rating: f32,
}

impl Interaction {
    pub fn new(user_id: impl Into<UserId>, item_id: impl Into<ItemId>, rating: f32) -> Self {
        Self {
            user_id: user_id.into(),
            item_id: item_id.into(),
            rating,
        }
    }
}

/// Descriptive data for an item.
///
/// Only `title` is vectorized; `title` and `author` are shown with results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub item_id: ItemId,
    pub title: Option<String>,
    pub author: Option<String>,
    pub year: Option<u16>,
    pub publisher: Option<String>,
}

impl ItemMetadata {
    pub fn new(
        item_id: impl Into<ItemId>,
        title: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            title: Some(title.into()),
            author: Some(author.into()),
            year: None,
            publisher: None,
        }
    }

    /// Title text used for vectorization; a missing title is the empty string
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

// =============================================================================
// Identifier Mapping
// =============================================================================

/// Bijection between external identifiers and dense indices.
///
/// Indices are handed out in first-seen order and never change once the
/// mapping is built.
#[derive(Debug, Clone, Default)]
pub struct IdMapping {
    ids: Vec<String>,
    index: HashMap<String, usize>,
}

impl IdMapping {
    /// Build a mapping from the distinct values of `ids`, keeping first-seen order
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapping = Self::default();
        for id in ids {
            mapping.intern(id.as_ref());
        }
        mapping
    }

    pub(crate) fn intern(&mut self, id: &str) -> usize {
        if let Some(&idx) = self.index.get(id) {
            return idx;
        }
        let idx = self.ids.len();
        self.ids.push(id.to_string());
        self.index.insert(id.to_string(), idx);
        idx
    }

    /// External id → dense index
    pub fn encode(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Dense index → external id
    pub fn decode(&self, index: usize) -> Option<&str> {
        self.ids.get(index).map(|s| s.as_str())
    }

    /// Distinct ids in first-seen order
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// =============================================================================
// InteractionRepository - the immutable snapshot
// =============================================================================

/// Holds the cleaned interactions, item metadata and derived identifier
/// mappings.
///
/// Built once by `InteractionRepository::new` (see `index.rs`) and read-only
/// afterwards, so it can be shared across engines behind an `Arc`.
#[derive(Debug, Default)]
pub struct InteractionRepository {
    pub(crate) users: IdMapping,
    pub(crate) items: IdMapping,

    /// Deduplicated (user, item, rating) triples, in order of first appearance
    /// of the pair. Duplicate pairs keep the last rating seen.
    pub(crate) triples: Vec<(UserIndex, ItemIndex, f32)>,

    /// Items rated by each user as (item, rating), sorted by item index
    pub(crate) user_ratings: Vec<Vec<(ItemIndex, f32)>>,

    pub(crate) metadata: HashMap<ItemId, ItemMetadata>,

    /// Observed (min, max) rating, `None` for an empty snapshot
    pub(crate) rating_range: Option<(f32, f32)>,
}

impl InteractionRepository {
    // Getters - all borrow from the snapshot

    /// User identifier mapping
    pub fn users(&self) -> &IdMapping {
        &self.users
    }

    /// Item identifier mapping
    pub fn items(&self) -> &IdMapping {
        &self.items
    }

    /// Distinct user ids in first-seen order
    pub fn user_ids(&self) -> &[String] {
        self.users.ids()
    }

    /// Distinct item ids in first-seen order
    pub fn item_ids(&self) -> &[String] {
        self.items.ids()
    }

    pub fn num_users(&self) -> usize {
        self.users.len()
    }

    pub fn num_items(&self) -> usize {
        self.items.len()
    }

    /// (users, items, interactions)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.users.len(), self.items.len(), self.triples.len())
    }

    /// Training rows as (user_index, item_index, rating)
    pub fn triples(&self) -> impl ExactSizeIterator<Item = (UserIndex, ItemIndex, f32)> + '_ {
        self.triples.iter().copied()
    }

    /// Resolve a user id, failing with the cold-start signal if absent
    pub fn user_index(&self, user_id: &str) -> Result<UserIndex, UnknownEntity> {
        self.users
            .encode(user_id)
            .ok_or_else(|| UnknownEntity::user(user_id))
    }

    /// Resolve an item id, failing with the cold-start signal if absent
    pub fn item_index(&self, item_id: &str) -> Result<ItemIndex, UnknownEntity> {
        self.items
            .encode(item_id)
            .ok_or_else(|| UnknownEntity::item(item_id))
    }

    /// Items rated by a user index, as (item, rating) sorted by item index.
    ///
    /// Returns an empty slice for an out-of-range index.
    pub fn rated_item_indices(&self, user: UserIndex) -> &[(ItemIndex, f32)] {
        self.user_ratings
            .get(user)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Items already rated by the given user
    pub fn rated_items(&self, user_id: &str) -> Result<Vec<&str>, UnknownEntity> {
        let user = self.user_index(user_id)?;
        Ok(self
            .rated_item_indices(user)
            .iter()
            .filter_map(|&(item, _)| self.items.decode(item))
            .collect())
    }

    /// Metadata for an item id, if the metadata table carries it
    pub fn metadata(&self, item_id: &str) -> Option<&ItemMetadata> {
        self.metadata.get(item_id)
    }

    /// Metadata for a dense item index
    pub fn metadata_at(&self, item: ItemIndex) -> Option<&ItemMetadata> {
        self.items.decode(item).and_then(|id| self.metadata.get(id))
    }

    /// Observed (min, max) rating of the snapshot
    pub fn rating_range(&self) -> Option<(f32, f32)> {
        self.rating_range
    }
}
