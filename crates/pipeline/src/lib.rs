//! Candidate plumbing shared by the recommendation engines.
//!
//! This crate provides:
//! - `Candidate` / `Recommendation` result types and the `Strategy` selector
//! - `UserContext`, the per-query view of what a user already rated
//! - Filter trait and implementations for candidate filtering
//! - FilterPipeline for composing filters
//! - Deterministic top-N ranking
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::{FilterPipeline, UserContext, rank_top_n};
//! use pipeline::filters::*;
//!
//! let context = UserContext::build(&repo, "276747")?;
//! let pipeline = FilterPipeline::new().add_filter(AlreadyRatedFilter);
//!
//! let unseen = pipeline.apply(candidates, &context);
//! let top = rank_top_n(unseen, 5);
//! ```

pub mod types;
pub mod traits;
pub mod filters;
pub mod filter_pipeline;
pub mod ranking;

// Re-export main types
pub use types::{Candidate, Recommendation, Strategy, UserContext};
pub use traits::Filter;
pub use filter_pipeline::FilterPipeline;
pub use ranking::{rank_order, rank_top_n};
