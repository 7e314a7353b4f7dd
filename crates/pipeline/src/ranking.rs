//! Deterministic top-N selection.
//!
//! All engines order by descending score and break ties on the ascending
//! item index, so equal scores always come back in the same order.

use crate::types::Candidate;
use std::cmp::Ordering;

/// Ordering used by every ranked result: score DESC, then item index ASC.
///
/// `total_cmp` keeps the comparison total even if a NaN slips in (it sorts
/// last among positives, first among negatives).
pub fn rank_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item.cmp(&b.item))
}

/// Sort candidates with `rank_order` and keep the first `n`.
pub fn rank_top_n(mut candidates: Vec<Candidate>, n: usize) -> Vec<Candidate> {
    if n == 0 {
        return Vec::new();
    }
    if candidates.len() > n {
        // Partition first so only the head needs a full sort
        candidates.select_nth_unstable_by(n - 1, rank_order);
        candidates.truncate(n);
    }
    candidates.sort_unstable_by(rank_order);
    candidates
}
