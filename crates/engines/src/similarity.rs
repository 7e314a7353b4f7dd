//! Sparse vectors and the symmetric similarity matrix built from them.
//!
//! Both engines reduce their entities (item titles, user rating rows) to
//! sparse vectors and need every pairwise cosine. Storage is a packed upper
//! triangle, so `get(a, b) == get(b, a)` holds by construction and memory is
//! halved compared to a full square.
//!
//! ## Algorithm
//! 1. L2-normalize every row
//! 2. Build an inverted index: feature -> [(row, weight)] sorted by row
//! 3. For each row `i` in parallel, walk the postings of its features and
//!    accumulate dot products against rows `j >= i` straight into row `i`'s
//!    slice of the packed buffer
//! 4. Clamp to [0, 1] (rounding can push a cosine a hair past 1) and set the
//!    diagonal to 1.0

use rayon::prelude::*;
use tracing::debug;

/// Sparse vector as (feature, weight) pairs sorted by feature
pub type SparseVector = Vec<(usize, f32)>;

/// Euclidean norm of a sparse vector
pub fn l2_norm(vector: &[(usize, f32)]) -> f32 {
    vector.iter().map(|&(_, w)| w * w).sum::<f32>().sqrt()
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn normalize(vector: &mut [(usize, f32)]) {
    let norm = l2_norm(vector);
    if norm > 0.0 {
        for (_, w) in vector.iter_mut() {
            *w /= norm;
        }
    }
}

/// Square, symmetric matrix of similarity scores in [0, 1]
#[derive(Debug, Clone)]
pub struct SimilarityMatrix {
    n: usize,
    packed: Vec<f32>,
}

impl SimilarityMatrix {
    /// Pairwise cosine similarity of `rows`.
    ///
    /// `rows` need not be normalized; each one is normalized on a copy.
    pub fn cosine(rows: &[SparseVector]) -> Self {
        let n = rows.len();
        let normalized: Vec<SparseVector> = rows
            .par_iter()
            .map(|row| {
                let mut row = row.clone();
                normalize(&mut row);
                row
            })
            .collect();

        // Inverted index; rows are pushed in ascending order so postings stay sorted
        let dims = normalized
            .iter()
            .flat_map(|row| row.iter().map(|&(f, _)| f + 1))
            .max()
            .unwrap_or(0);
        let mut postings: Vec<Vec<(usize, f32)>> = vec![Vec::new(); dims];
        for (row_idx, row) in normalized.iter().enumerate() {
            for &(feature, weight) in row {
                postings[feature].push((row_idx, weight));
            }
        }

        let mut packed = vec![0.0f32; n * (n + 1) / 2];
        let mut slices: Vec<&mut [f32]> = Vec::with_capacity(n);
        let mut rest: &mut [f32] = &mut packed;
        for i in 0..n {
            let (head, tail) = std::mem::take(&mut rest).split_at_mut(n - i);
            slices.push(head);
            rest = tail;
        }

        slices.into_par_iter().enumerate().for_each(|(i, out)| {
            for &(feature, weight) in &normalized[i] {
                let list = &postings[feature];
                let start = list.partition_point(|&(row, _)| row < i);
                for &(j, other) in &list[start..] {
                    out[j - i] += weight * other;
                }
            }
            for value in out.iter_mut() {
                *value = value.clamp(0.0, 1.0);
            }
            out[0] = 1.0;
        });

        debug!(
            "Computed {}x{} similarity matrix over {} features",
            n, n, dims
        );
        Self { n, packed }
    }

    /// Number of rows (and columns)
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    fn offset(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i <= j { (i, j) } else { (j, i) };
        // Row i of the upper triangle starts after rows 0..i, of lengths n, n-1, ...
        i * self.n - i * i.saturating_sub(1) / 2 + (j - i)
    }

    /// Similarity between rows `a` and `b`; panics if either is out of range
    pub fn get(&self, a: usize, b: usize) -> f32 {
        assert!(a < self.n && b < self.n, "similarity index out of range");
        self.packed[self.offset(a, b)]
    }

    /// Full row `a` as a dense vector
    pub fn row(&self, a: usize) -> Vec<f32> {
        (0..self.n).map(|b| self.get(a, b)).collect()
    }
}
