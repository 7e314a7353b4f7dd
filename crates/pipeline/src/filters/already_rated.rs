//! Filter to remove items the user has already rated.
//!
//! Applied before ranking by every user-facing strategy; there is no point
//! in recommending a book the user has already given an opinion on.

use crate::traits::Filter;
use crate::types::{Candidate, UserContext};

/// Removes candidates that the user has already rated.
///
/// ## Algorithm
/// Uses the HashSet in UserContext.rated_items for O(1) lookups.
pub struct AlreadyRatedFilter;

impl Filter for AlreadyRatedFilter {
    fn name(&self) -> &str {
        "AlreadyRatedFilter"
    }

    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Vec<Candidate> {
        candidates
            .into_iter()
            .filter(|candidate| !context.rated_items.contains(&candidate.item))
            .collect()
    }
}
