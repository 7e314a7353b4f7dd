//! # Engines Crate
//!
//! The two similarity-based recommendation strategies and the numeric
//! building blocks they share.
//!
//! ## Components
//!
//! - **similarity**: Sparse vectors and the packed symmetric `SimilarityMatrix`
//! - **text**: Title tokenizer, stop words, `TfidfVectorizer`
//! - **content**: `ContentEngine` (item → similar items by title)
//! - **neighborhood**: `NeighborhoodEngine` (user → items liked by similar users)
//!
//! ## Example Usage
//! ```ignore
//! use engines::{ContentConfig, ContentEngine, NeighborhoodConfig, NeighborhoodEngine};
//!
//! let content = ContentEngine::build(repo.clone(), &ContentConfig::default());
//! let similar = content.similar_items("0439064872", 5)?;
//!
//! let neighborhood = NeighborhoodEngine::build(repo.clone(), &NeighborhoodConfig::default());
//! let picks = neighborhood.recommend_for_user("276747", 5)?;
//! ```

pub mod similarity;
pub mod text;
pub mod content;
pub mod neighborhood;

pub use similarity::{SimilarityMatrix, SparseVector};
pub use text::TfidfVectorizer;
pub use content::{ContentConfig, ContentEngine};
pub use neighborhood::{NeighborhoodConfig, NeighborhoodEngine};
