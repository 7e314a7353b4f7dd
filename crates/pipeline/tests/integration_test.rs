//! Integration tests for the pipeline.
//!
//! These tests verify that filters, ranking and metadata resolution work
//! together the way the engines chain them.

use data_loader::{Interaction, InteractionRepository, ItemMetadata};
use pipeline::filters::*;
use pipeline::{rank_top_n, Candidate, FilterPipeline, Recommendation, Strategy, UserContext};
use std::sync::Arc;

fn create_test_setup() -> (Arc<InteractionRepository>, Vec<Candidate>) {
    let interactions = vec![
        // Reader 1 has rated books 0 and 1
        Interaction::new("r1", "isbn-0", 9.0),
        Interaction::new("r1", "isbn-1", 4.0),
        // Reader 2 introduces the rest of the catalogue
        Interaction::new("r2", "isbn-2", 8.0),
        Interaction::new("r2", "isbn-3", 7.0),
        Interaction::new("r2", "isbn-4", 7.0),
    ];
    let metadata = vec![
        ItemMetadata::new("isbn-0", "The Hobbit", "J. R. R. Tolkien"),
        ItemMetadata::new("isbn-1", "Emma", "Jane Austen"),
        ItemMetadata::new("isbn-2", "Dune", "Frank Herbert"),
        // isbn-3 has no metadata row
        ItemMetadata::new("isbn-4", "Persuasion", "Jane Austen"),
    ];
    let repo = Arc::new(InteractionRepository::new(interactions, metadata));

    let candidates = vec![
        Candidate::new(0, Strategy::Neighborhood, 9.5), // rated - should be filtered
        Candidate::new(1, Strategy::Neighborhood, 9.0), // rated - should be filtered
        Candidate::new(2, Strategy::Neighborhood, 7.0),
        Candidate::new(3, Strategy::Neighborhood, 8.0), // no metadata
        Candidate::new(4, Strategy::Neighborhood, 7.0), // ties with 2
    ];

    (repo, candidates)
}

#[test]
fn test_filter_then_rank() {
    let (repo, candidates) = create_test_setup();
    let context = UserContext::build(&repo, "r1").unwrap();

    let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);
    let ranked = rank_top_n(pipeline.apply(candidates, &context), 10);

    let items: Vec<usize> = ranked.iter().map(|c| c.item).collect();
    assert_eq!(items, vec![3, 2, 4]);
    for candidate in &ranked {
        assert!(!context.rated_items.contains(&candidate.item));
    }
}

#[test]
fn test_metadata_filter_after_truncation_underfills() {
    let (repo, candidates) = create_test_setup();
    let context = UserContext::build(&repo, "r1").unwrap();

    let unseen = FilterPipeline::new()
        .add_filter(AlreadyRatedFilter)
        .apply(candidates, &context);
    let top = rank_top_n(unseen, 2);
    let presentable = FilterPipeline::new()
        .add_filter(KnownMetadataFilter::new(repo.clone()))
        .apply(top, &context);

    // isbn-3 was in the top 2 but has no metadata, so only one row is left
    assert_eq!(presentable.len(), 1);

    let recommendations = Recommendation::resolve_all(&presentable, &repo);
    assert_eq!(recommendations[0].item_id, "isbn-2");
    assert_eq!(recommendations[0].title.as_deref(), Some("Dune"));
    assert_eq!(recommendations[0].author.as_deref(), Some("Frank Herbert"));
}
