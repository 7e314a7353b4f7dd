//! Integration tests for the facade.
//!
//! These build all three engines from one small snapshot and check routing,
//! cold-start handling and the latent failure path.

use std::sync::Arc;

use data_loader::{Interaction, InteractionRepository, ItemMetadata, UnknownEntity};
use latent::{StopSignal, TrainingConfig, TrainingError};
use recommender::{RecommendError, RecommendOutcome, RecommendationFacade, RecommenderConfig, Strategy};

const TITLES: [&str; 6] = [
    "Harry Potter and the Sorcerer's Stone",
    "Harry Potter and the Chamber of Secrets",
    "Pride and Prejudice",
    "Sense and Sensibility",
    "The Hobbit",
    "The Annotated Hobbit",
];

fn create_test_repo() -> Arc<InteractionRepository> {
    let mut interactions = Vec::new();
    for user in 0..12 {
        for item in 0..6 {
            // each reader skips one or two books
            if (user + item) % 6 == 0 || (user % 3 == 0 && item == (user + 3) % 6) {
                continue;
            }
            let rating = (item + 1) as f32 + (user % 2) as f32;
            interactions.push(Interaction::new(format!("u{user}"), format!("b{item}"), rating));
        }
    }
    // one reader has rated the whole catalogue
    for item in 0..6 {
        interactions.push(Interaction::new("completist", format!("b{item}"), 7.0));
    }

    let metadata = TITLES
        .iter()
        .enumerate()
        .map(|(item, title)| ItemMetadata::new(format!("b{item}"), *title, "Various"))
        .collect();
    Arc::new(InteractionRepository::new(interactions, metadata))
}

fn test_config() -> RecommenderConfig {
    RecommenderConfig::default().with_training(
        TrainingConfig::default()
            .with_embedding_dim(4)
            .with_learning_rate(0.05),
    )
}

async fn build(config: &RecommenderConfig) -> RecommendationFacade {
    RecommendationFacade::build(create_test_repo(), config, StopSignal::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_dispatch_by_strategy() {
    let facade = build(&test_config()).await;
    assert!(facade.latent_report().is_ok());

    for (strategy, subject) in [
        (Strategy::Content, "b0"),
        (Strategy::Neighborhood, "u1"),
        (Strategy::Latent, "u1"),
    ] {
        let outcome = facade.recommend(strategy, subject, 3).unwrap();
        let items = outcome.items();
        assert!(!items.is_empty(), "{strategy} returned nothing");
        assert!(items.len() <= 3);
        assert!(items.iter().all(|r| r.source == strategy));
        assert!(items.windows(2).all(|w| w[0].score >= w[1].score));
    }

    // content: the other Harry Potter book reads most alike
    let outcome = facade.recommend(Strategy::Content, "b0", 1).unwrap();
    assert_eq!(outcome.items()[0].item_id, "b1");
}

#[tokio::test]
async fn test_user_strategies_skip_rated_items() {
    let facade = build(&test_config()).await;
    let repo = facade.repository().clone();

    for strategy in [Strategy::Neighborhood, Strategy::Latent] {
        for user in ["u0", "u1", "u3", "u7"] {
            let rated = repo.rated_items(user).unwrap();
            let outcome = facade.recommend(strategy, user, 10).unwrap();
            assert!(outcome.items().iter().all(|r| !rated.contains(&r.item_id.as_str())));
        }
    }
}

#[tokio::test]
async fn test_unknown_subject_for_every_strategy() {
    let facade = build(&test_config()).await;

    for strategy in Strategy::ALL {
        let err = facade.recommend(strategy, "stranger", 5).unwrap_err();
        assert!(
            matches!(err, RecommendError::UnknownEntity(_)),
            "{strategy}: {err:?}"
        );
    }
    assert_eq!(
        facade.recommend(Strategy::Latent, "stranger", 5).unwrap_err(),
        RecommendError::UnknownEntity(UnknownEntity::user("stranger"))
    );
}

#[tokio::test]
async fn test_rated_everything_is_insufficient_data() {
    let facade = build(&test_config()).await;

    for strategy in [Strategy::Neighborhood, Strategy::Latent] {
        let outcome = facade.recommend(strategy, "completist", 5).unwrap();
        assert_eq!(outcome, RecommendOutcome::InsufficientData);
        assert!(outcome.is_insufficient());
    }
}

#[tokio::test]
async fn test_zero_top_n_is_not_insufficient_data() {
    let facade = build(&test_config()).await;

    for (strategy, subject) in [
        (Strategy::Content, "b0"),
        (Strategy::Neighborhood, "u1"),
        (Strategy::Latent, "u1"),
    ] {
        let outcome = facade.recommend(strategy, subject, 0).unwrap();
        assert_eq!(outcome, RecommendOutcome::Ranked(Vec::new()), "{strategy}");
    }
    assert_eq!(
        facade.similar_to_title("The Hobbit", 0).unwrap(),
        RecommendOutcome::Ranked(Vec::new())
    );

    // still insufficient when nothing at all is eligible
    let outcome = facade.recommend(Strategy::Neighborhood, "completist", 0).unwrap();
    assert!(outcome.is_insufficient());
}

#[tokio::test]
async fn test_training_failure_only_affects_latent() {
    let config = RecommenderConfig::default().with_training(
        TrainingConfig::default()
            .with_embedding_dim(4)
            .with_learning_rate(f32::INFINITY),
    );
    let facade = build(&config).await;

    assert!(matches!(
        facade.latent_report(),
        Err(TrainingError::Diverged { .. })
    ));
    assert!(matches!(
        facade.recommend(Strategy::Latent, "u1", 5),
        Err(RecommendError::TrainingDivergence(TrainingError::Diverged { .. }))
    ));
    assert!(facade.recommend(Strategy::Content, "b2", 5).is_ok());
    assert!(facade.recommend(Strategy::Neighborhood, "u1", 5).is_ok());
}

#[tokio::test]
async fn test_stop_before_build_cancels_training() {
    let stop = StopSignal::new();
    stop.stop();
    let facade = RecommendationFacade::build(create_test_repo(), &test_config(), stop)
        .await
        .unwrap();

    assert_eq!(facade.latent_report().unwrap_err(), &TrainingError::Cancelled);
    assert!(facade.latent().is_none());
    assert!(facade.recommend(Strategy::Content, "b0", 2).is_ok());
}

#[tokio::test]
async fn test_similar_to_title() {
    let facade = build(&test_config()).await;
    let outcome = facade.similar_to_title("The Hobbit", 1).unwrap();
    assert_eq!(outcome.items()[0].item_id, "b5");

    assert!(matches!(
        facade.similar_to_title("Unknown Title", 1),
        Err(RecommendError::UnknownEntity(_))
    ));
}
