//! Shared candidate and result types.
//!
//! Every engine scores dense item indices as `Candidate`s, then resolves the
//! survivors into `Recommendation`s carrying the external id and metadata.

use data_loader::{InteractionRepository, ItemId, ItemIndex, UnknownEntity, UserIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Which engine produced a candidate (and which one a query is routed to)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Item → item similarity over title text
    Content,
    /// User → user neighborhood aggregation
    Neighborhood,
    /// Trained latent-factor model
    Latent,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Content, Strategy::Neighborhood, Strategy::Latent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Content => "content",
            Strategy::Neighborhood => "neighborhood",
            Strategy::Latent => "latent",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "content" => Ok(Strategy::Content),
            "neighborhood" | "collaborative" => Ok(Strategy::Neighborhood),
            "latent" | "model" => Ok(Strategy::Latent),
            other => Err(format!(
                "unknown strategy '{}', expected content, neighborhood or latent",
                other
            )),
        }
    }
}

/// A scored item produced by an engine, before metadata is joined
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub item: ItemIndex,
    pub source: Strategy,
    pub score: f32,
}

impl Candidate {
    pub fn new(item: ItemIndex, source: Strategy, score: f32) -> Self {
        Self { item, source, score }
    }
}

/// Final ranked entry returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub item_id: ItemId,
    pub score: f32,
    pub title: Option<String>,
    pub author: Option<String>,
    pub source: Strategy,
}

impl Recommendation {
    /// Map a candidate back to its external id and join whatever metadata exists
    pub fn resolve(candidate: &Candidate, repo: &InteractionRepository) -> Option<Self> {
        let item_id = repo.items().decode(candidate.item)?;
        let meta = repo.metadata(item_id);
        Some(Self {
            item_id: item_id.to_string(),
            score: candidate.score,
            title: meta.and_then(|m| m.title.clone()),
            author: meta.and_then(|m| m.author.clone()),
            source: candidate.source,
        })
    }

    /// Resolve a ranked list, keeping its order
    pub fn resolve_all(candidates: &[Candidate], repo: &InteractionRepository) -> Vec<Self> {
        candidates
            .iter()
            .filter_map(|candidate| Self::resolve(candidate, repo))
            .collect()
    }
}

/// What the user-facing engines need to know about the query subject
#[derive(Debug, Clone)]
pub struct UserContext {
    pub user: UserIndex,
    pub user_id: String,
    /// Items the user has rated, for O(1) exclusion
    pub rated_items: HashSet<ItemIndex>,
}

impl UserContext {
    pub fn new(user: UserIndex, user_id: impl Into<String>) -> Self {
        Self {
            user,
            user_id: user_id.into(),
            rated_items: HashSet::new(),
        }
    }

    /// Build the context for `user_id`, failing with `UnknownEntity` if the
    /// user is not part of the snapshot
    pub fn build(repo: &InteractionRepository, user_id: &str) -> Result<Self, UnknownEntity> {
        let user = repo.user_index(user_id)?;
        let mut context = Self::new(user, user_id);
        context.rated_items = repo
            .rated_item_indices(user)
            .iter()
            .map(|&(item, _)| item)
            .collect();
        Ok(context)
    }
}
