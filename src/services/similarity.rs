use rayon::prelude::*;

use super::features::FeatureMatrix;
use super::sparse::SparseVector;

/// A catalog row paired with its cosine similarity to the query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub score: f64,
}

/// Read-only nearest-neighbor view over a feature matrix.
///
/// Similarities are computed per query, so no dense n×n matrix is held.
#[derive(Debug, Clone, Copy)]
pub struct SimilarityIndex<'a> {
    features: &'a FeatureMatrix,
}

impl<'a> SimilarityIndex<'a> {
    pub fn new(features: &'a FeatureMatrix) -> Self {
        Self { features }
    }

    /// Returns up to `k` rows ordered by cosine similarity descending, ties in
    /// row order, never including `exclude`.
    pub fn nearest(&self, query: &SparseVector, k: usize, exclude: Option<usize>) -> Vec<Neighbor> {
        let query_magnitude = query.magnitude();

        let mut scores: Vec<Neighbor> = (0..self.features.len())
            .into_par_iter()
            .filter(|&row| Some(row) != exclude)
            .map(|row| Neighbor {
                row,
                score: self.features.similarity_to(query, query_magnitude, row),
            })
            .collect();

        // stable sort keeps row order among equal scores
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));
        scores.truncate(k);
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(rows: &[&[(u32, f32)]]) -> FeatureMatrix {
        let rows = rows
            .iter()
            .map(|r| SparseVector::from_pairs(r.to_vec()))
            .collect();
        FeatureMatrix::from_rows(rows, 4)
    }

    #[test]
    fn test_orders_by_similarity_and_excludes_query() {
        let features = matrix(&[
            &[(0, 1.0)],
            &[(0, 1.0), (1, 1.0)],
            &[(1, 1.0)],
            &[(0, 1.0), (1, 0.1)],
        ]);
        let index = SimilarityIndex::new(&features);
        let result = index.nearest(features.row(0).unwrap(), 10, Some(0));
        let rows: Vec<usize> = result.iter().map(|n| n.row).collect();
        assert_eq!(rows, vec![3, 1, 2]);
        assert!(result.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_row_order() {
        let features = matrix(&[&[(0, 1.0)], &[(1, 1.0)], &[(1, 2.0)], &[(1, 1.0)]]);
        let index = SimilarityIndex::new(&features);
        let rows: Vec<usize> = index
            .nearest(&SparseVector::from_pairs(vec![(1, 1.0)]), 10, None)
            .iter()
            .map(|n| n.row)
            .collect();
        assert_eq!(rows, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_k_larger_than_population() {
        let features = matrix(&[&[(0, 1.0)], &[(1, 1.0)]]);
        let index = SimilarityIndex::new(&features);
        let query = features.row(0).unwrap();
        assert_eq!(index.nearest(query, 50, Some(0)).len(), 1);
        assert!(index.nearest(query, 0, Some(0)).is_empty());
    }
}
