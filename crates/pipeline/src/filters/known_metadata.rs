//! Filter to drop items that have no metadata row.
//!
//! The neighborhood strategy presents results as (id, title, author) rows and
//! silently leaves out items that only appear in the ratings table, which
//! may leave fewer results than requested.

use crate::traits::Filter;
use crate::types::{Candidate, UserContext};
use data_loader::InteractionRepository;
use std::sync::Arc;

/// Keeps only candidates whose item has a metadata entry.
pub struct KnownMetadataFilter {
    repo: Arc<InteractionRepository>,
}

impl KnownMetadataFilter {
    pub fn new(repo: Arc<InteractionRepository>) -> Self {
        Self { repo }
    }
}

impl Filter for KnownMetadataFilter {
    fn name(&self) -> &str {
        "KnownMetadataFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, _context: &UserContext) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| self.repo.metadata_at(candidate.item).is_some())
            .collect()
    }
}
