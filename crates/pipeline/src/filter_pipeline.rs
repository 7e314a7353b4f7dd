//! The FilterPipeline orchestrates multiple filters.
//!
//! This module provides the main FilterPipeline struct that chains
//! multiple filters together using the builder pattern.

use crate::traits::Filter;
use crate::types::{Candidate, UserContext};

/// Chains multiple filters together into a processing pipeline.
///
/// ## Usage
/// ```ignore
/// let pipeline = FilterPipeline::new()
///     .add_filter(AlreadyRatedFilter)
///     .add_filter(KnownMetadataFilter::new(repo.clone()));
///
/// let filtered = pipeline.apply(candidates, &context);
/// ```
pub struct FilterPipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterPipeline {
    /// Create a new empty FilterPipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline (builder pattern).
    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Apply all filters in sequence to the candidates.
    pub fn apply(&self, candidates: Vec<Candidate>, context: &UserContext) -> Vec<Candidate> {
        let mut current = candidates;
        for filter in &self.filters {
            let before = current.len();
            current = filter.apply(current, context);
            tracing::debug!(
                "Filter {} applied ({} -> {} candidates)",
                filter.name(),
                before,
                current.len()
            );
        }
        current
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::AlreadyRatedFilter;
    use crate::types::Strategy;

    #[test]
    fn test_empty_pipeline() {
        let pipeline = FilterPipeline::new();
        let context = UserContext::new(0, "u1");

        let candidates = vec![
            Candidate::new(1, Strategy::Neighborhood, 0.9),
            Candidate::new(2, Strategy::Neighborhood, 0.8),
        ];

        let filtered = pipeline.apply(candidates, &context);
        assert_eq!(filtered.len(), 2);
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_single_filter() {
        let mut context = UserContext::new(0, "u1");
        context.rated_items.insert(1);

        let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);

        let candidates = vec![
            Candidate::new(1, Strategy::Latent, 0.9),
            Candidate::new(2, Strategy::Latent, 0.8),
        ];

        let filtered = pipeline.apply(candidates, &context);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].item, 2);
    }
}
