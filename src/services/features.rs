use std::time::Instant;

use crate::models::CatalogEntry;

use super::sparse::{cosine_similarity_with_magnitude, SparseVector};
use super::tfidf::{TfidfMatrix, TfidfVectorizer};

/// Vocabulary cap for the synopsis field; other fields are uncapped
pub const SYNOPSIS_MAX_FEATURES: usize = 10_000;

/// Per-field multipliers applied before concatenation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    pub genres: f32,
    pub themes: f32,
    pub synopsis: f32,
    pub studios: f32,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            genres: 2.0,
            themes: 1.5,
            synopsis: 1.0,
            studios: 0.5,
        }
    }
}

/// Combined feature vectors, one per catalog row, in catalog order
#[derive(Debug, Clone, Default)]
pub struct FeatureMatrix {
    rows: Vec<SparseVector>,
    magnitudes: Vec<f64>,
    dim: u32,
}

impl FeatureMatrix {
    pub fn from_rows(rows: Vec<SparseVector>, dim: u32) -> Self {
        let magnitudes = rows.iter().map(SparseVector::magnitude).collect();
        Self {
            rows,
            magnitudes,
            dim,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn dim(&self) -> u32 {
        self.dim
    }

    pub fn row(&self, index: usize) -> Option<&SparseVector> {
        self.rows.get(index)
    }

    pub fn magnitude(&self, index: usize) -> f64 {
        self.magnitudes.get(index).copied().unwrap_or(0.0)
    }

    /// Cosine similarity between two rows
    pub fn similarity(&self, a: usize, b: usize) -> f64 {
        match (self.rows.get(a), self.rows.get(b)) {
            (Some(va), Some(vb)) => {
                cosine_similarity_with_magnitude(va, vb, self.magnitudes[a], self.magnitudes[b])
            }
            _ => 0.0,
        }
    }

    /// Cosine similarity between a query vector and a row
    pub fn similarity_to(&self, query: &SparseVector, query_magnitude: f64, row: usize) -> f64 {
        match self.rows.get(row) {
            Some(v) => cosine_similarity_with_magnitude(query, v, query_magnitude, self.magnitudes[row]),
            None => 0.0,
        }
    }
}

/// Builds weighted TF-IDF feature vectors over the text fields of a catalog
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEncoder {
    pub weights: FieldWeights,
}

impl FeatureEncoder {
    /// Vectorizes genres, themes, synopsis and studios independently, then
    /// concatenates the unit-norm field vectors scaled by their weights.
    pub fn build_features(&self, entries: &[CatalogEntry]) -> FeatureMatrix {
        let start = Instant::now();

        let field = |select: fn(&CatalogEntry) -> &str, max_features: Option<usize>| {
            let docs: Vec<&str> = entries.iter().map(select).collect();
            TfidfVectorizer::new(max_features).fit_transform(&docs)
        };

        let blocks: [(TfidfMatrix, f32); 4] = [
            (field(|e| e.genres.as_str(), None), self.weights.genres),
            (field(|e| e.themes.as_str(), None), self.weights.themes),
            (
                field(|e| e.synopsis.as_str(), Some(SYNOPSIS_MAX_FEATURES)),
                self.weights.synopsis,
            ),
            (field(|e| e.studios.as_str(), None), self.weights.studios),
        ];

        let dim: u32 = blocks.iter().map(|(m, _)| m.dim()).sum();
        let rows = (0..entries.len())
            .map(|row| {
                let mut combined = SparseVector::default();
                let mut offset = 0u32;
                for (matrix, weight) in &blocks {
                    combined.extend_shifted(&matrix.rows[row], offset, *weight);
                    offset += matrix.dim();
                }
                combined
            })
            .collect();

        tracing::info!(
            entries = entries.len(),
            dim,
            genre_terms = blocks[0].0.dim(),
            theme_terms = blocks[1].0.dim(),
            synopsis_terms = blocks[2].0.dim(),
            studio_terms = blocks[3].0.dim(),
            processing_time_ms = start.elapsed().as_millis(),
            "Feature vectors built"
        );

        FeatureMatrix::from_rows(rows, dim)
    }
}
