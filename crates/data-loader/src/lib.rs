//! # Data Loader Crate
//!
//! This crate holds the interaction snapshot every recommendation engine
//! reads from, plus the ingestion code that produces it from the
//! Book-Crossing CSV files.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Interaction, ItemMetadata, IdMapping, InteractionRepository)
//! - **index**: Build the repository (id interning, dedup, per-user index)
//! - **parser**: Parse and clean Ratings.csv / Books.csv
//! - **error**: Load errors and the `UnknownEntity` cold-start signal
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{CleaningConfig, InteractionRepository};
//! use std::path::Path;
//!
//! let repo = InteractionRepository::load_from_dir(
//!     Path::new("data/book-crossing"),
//!     &CleaningConfig::default(),
//! )?;
//!
//! let user = repo.user_index("276747")?;
//! println!("User rated {} books", repo.rated_item_indices(user).len());
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, EntityKind, Result, UnknownEntity};
pub use parser::CleaningConfig;
pub use types::{
    // Type aliases
    UserId,
    ItemId,
    UserIndex,
    ItemIndex,
    // Core types
    Interaction,
    ItemMetadata,
    IdMapping,
    InteractionRepository,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_repository() {
        let repo = InteractionRepository::new(Vec::new(), Vec::new());
        let (users, items, interactions) = repo.counts();

        assert_eq!(users, 0);
        assert_eq!(items, 0);
        assert_eq!(interactions, 0);
        assert!(repo.user_index("1").is_err());
        assert!(repo.rated_item_indices(0).is_empty());
    }

    #[test]
    fn test_id_mapping_from_ids() {
        let mapping = IdMapping::from_ids(["x", "y", "x", "z"]);
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping.encode("z"), Some(2));
        assert_eq!(mapping.decode(1), Some("y"));
        assert_eq!(mapping.decode(3), None);
        assert_eq!(mapping.encode("w"), None);
    }

    #[test]
    fn test_unknown_lookups_are_typed() {
        let repo = InteractionRepository::new(
            vec![Interaction::new("u1", "b1", 7.0)],
            Vec::new(),
        );
        let err = repo.item_index("b9").unwrap_err();
        assert_eq!(err.kind, EntityKind::Item);
        assert_eq!(err.id, "b9");
    }
}
