//! Core traits for the filtering pipeline.
//!
//! This module defines the Filter trait that allows composable,
//! extensible filters to be applied to candidate sets.

use crate::types::{Candidate, UserContext};

/// Core trait for filtering candidates.
///
/// ## Design Note
/// - `Send + Sync` so engines holding a pipeline stay shareable across threads
/// - Filters take ownership of the Vec<Candidate> and return a filtered Vec
/// - Filtering never fails: every lookup it needs is infallible on a
///   frozen snapshot
pub trait Filter: Send + Sync {
    /// Returns the name of this filter (for logging/debugging)
    fn name(&self) -> &str;

    /// Apply this filter to a set of candidates.
    fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Vec<Candidate>;
}
