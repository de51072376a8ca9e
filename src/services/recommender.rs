use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::{
    error::AppResult,
    models::{AnimeId, CatalogEntry, RawRecord, Recommendation, SearchHit},
};

use super::catalog::{CatalogSnapshot, SearchField};
use super::diversity::{diversify_by_genre, mmr_rerank};
use super::features::{FeatureEncoder, FeatureMatrix};
use super::sanitize::sanitize_f64;
use super::series_filter::{collapse_duplicate_cores, filter_same_series};
use super::similarity::SimilarityIndex;
use super::sparse::SparseVector;

/// Recommendation pipeline tuning
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Nearest neighbors fetched before filtering
    pub default_candidates: usize,
    pub max_per_genre: usize,
    /// MMR keeps `over_fetch_factor * k` candidates
    pub over_fetch_factor: usize,
    /// Genre capping looks at the first `genre_window_factor * k` candidates
    pub genre_window_factor: usize,
    pub search_fields: Vec<SearchField>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_candidates: 100,
            max_per_genre: 3,
            over_fetch_factor: 3,
            genre_window_factor: 2,
            search_fields: vec![
                SearchField::EnglishName,
                SearchField::Name,
                SearchField::JapaneseNames,
            ],
        }
    }
}

/// Catalog and derived features, built once and never mutated
#[derive(Debug)]
pub struct EngineSnapshot {
    catalog: CatalogSnapshot,
    features: FeatureMatrix,
    config: EngineConfig,
    loaded_at: DateTime<Utc>,
}

impl EngineSnapshot {
    /// Encodes features for a catalog
    pub fn build(catalog: CatalogSnapshot, config: EngineConfig) -> Self {
        let features = FeatureEncoder::default().build_features(catalog.entries());
        Self {
            catalog,
            features,
            config,
            loaded_at: Utc::now(),
        }
    }

    pub fn from_entries(entries: Vec<CatalogEntry>, raw: Vec<RawRecord>, config: EngineConfig) -> Self {
        Self::build(CatalogSnapshot::from_entries(entries, raw), config)
    }

    /// Loads both catalog files and encodes features. Blocking.
    pub fn load(catalog_path: &Path, raw_path: &Path, config: EngineConfig) -> AppResult<Self> {
        let start = Instant::now();
        let catalog = CatalogSnapshot::load(catalog_path, raw_path)?;
        let snapshot = Self::build(catalog, config);
        tracing::info!(
            entries = snapshot.catalog.len(),
            processing_time_ms = start.elapsed().as_millis(),
            "Engine snapshot ready"
        );
        Ok(snapshot)
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Title search over the configured name fields
    pub fn search(&self, query: &str, limit: usize) -> Vec<SearchHit> {
        self.catalog.search(query, &self.config.search_fields, limit)
    }

    /// Names of the seeds present in the catalog, in input order
    pub fn seed_names(&self, seed_ids: &[AnimeId]) -> Vec<String> {
        seed_ids
            .iter()
            .filter_map(|&id| self.catalog.row_index_of(id))
            .filter_map(|row| self.catalog.display_fields(row))
            .map(|d| d.name)
            .collect()
    }

    /// Recommends `k` titles similar to the first seed found in the catalog.
    ///
    /// Later seeds are ignored. Pipeline: nearest neighbors, same-series
    /// filtering (falling back to a plain top-k query when it removes
    /// everything), MMR re-ranking when the pool exceeds `k`, then a per-genre
    /// cap over the leading `2k` candidates.
    pub fn recommend(&self, seed_ids: &[AnimeId], k: usize, lambda_mult: f64) -> Vec<Recommendation> {
        if k == 0 {
            return Vec::new();
        }
        let Some(query_row) = seed_ids.iter().find_map(|&id| self.catalog.row_index_of(id)) else {
            tracing::debug!(seeds = seed_ids.len(), "No seed id found in catalog");
            return Vec::new();
        };
        let Some(query) = self.features.row(query_row) else {
            return Vec::new();
        };

        let index = SimilarityIndex::new(&self.features);
        let entries = self.catalog.entries();

        let pool: Vec<usize> = index
            .nearest(query, self.config.default_candidates, Some(query_row))
            .into_iter()
            .map(|n| n.row)
            .collect();

        let filtered = filter_same_series(&pool, query_row, entries);
        let mut candidates = collapse_duplicate_cores(&filtered, entries);
        if candidates.is_empty() {
            tracing::debug!(pool = pool.len(), "Series filter emptied the pool, using plain top-k");
            candidates = index
                .nearest(query, k, Some(query_row))
                .into_iter()
                .map(|n| n.row)
                .collect();
        }

        if candidates.len() > k {
            let top_n = k.saturating_mul(self.config.over_fetch_factor);
            candidates = self.rerank(&candidates, query, lambda_mult, top_n);
        }

        let window = candidates.len().min(k.saturating_mul(self.config.genre_window_factor));
        let mut rows = diversify_by_genre(&candidates[..window], entries, self.config.max_per_genre);
        rows.truncate(k);

        tracing::debug!(
            query_row,
            pool = pool.len(),
            after_filter = filtered.len(),
            returned = rows.len(),
            "Recommendation pipeline finished"
        );

        let query_magnitude = query.magnitude();
        rows.into_iter()
            .filter_map(|row| self.to_recommendation(row, query, query_magnitude))
            .collect()
    }

    fn rerank(&self, candidates: &[usize], query: &SparseVector, lambda_mult: f64, top_n: usize) -> Vec<usize> {
        let vectors: Vec<&SparseVector> = candidates
            .iter()
            .filter_map(|&row| self.features.row(row))
            .collect();
        mmr_rerank(&vectors, query, lambda_mult, top_n)
            .into_iter()
            .map(|pos| candidates[pos])
            .collect()
    }

    fn to_recommendation(&self, row: usize, query: &SparseVector, query_magnitude: f64) -> Option<Recommendation> {
        let entry = self.catalog.entry(row)?;
        let display = self.catalog.display_fields(row)?;
        Some(Recommendation {
            anime_id: entry.anime_id,
            name: display.name,
            similarity: sanitize_f64(self.features.similarity_to(query, query_magnitude, row)),
            score: display.score,
            episodes: display.episodes,
            genres: display.genres,
            image_url: display.image_url,
            anime_url: display.anime_url,
            summary: None,
        })
    }
}

/// Holds the active snapshot; reloads swap the whole snapshot at once.
///
/// Readers clone the `Arc` and drop the lock immediately, so requests that
/// started before a swap finish against the snapshot they began with.
pub struct SnapshotStore {
    current: RwLock<Arc<EngineSnapshot>>,
}

impl SnapshotStore {
    pub fn new(snapshot: EngineSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub async fn current(&self) -> Arc<EngineSnapshot> {
        self.current.read().await.clone()
    }

    /// Installs `snapshot` and returns the one it replaced
    pub async fn swap(&self, snapshot: EngineSnapshot) -> Arc<EngineSnapshot> {
        let mut guard = self.current.write().await;
        std::mem::replace(&mut *guard, Arc::new(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: AnimeId, name: &str, genres: &str, synopsis: &str) -> CatalogEntry {
        let mut e = CatalogEntry::new(id, name);
        e.genres = genres.to_string();
        e.synopsis = synopsis.to_string();
        e
    }

    fn snapshot() -> EngineSnapshot {
        EngineSnapshot::from_entries(
            vec![
                entry(1, "Naruto", "action, adventure", "young ninja village hokage"),
                entry(2, "Naruto: Shippuuden", "action, adventure", "ninja village hokage returns"),
                entry(3, "Bleach", "action, adventure", "soul reaper hollow swords"),
                entry(4, "Hunter x Hunter", "action, adventure", "young hunter exam"),
                entry(5, "K-On!", "comedy", "school band club"),
            ],
            Vec::new(),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_recommend_skips_same_series_and_seed() {
        let engine = snapshot();
        let recs = engine.recommend(&[1], 3, 0.7);
        let ids: Vec<AnimeId> = recs.iter().map(|r| r.anime_id).collect();
        assert!(!ids.contains(&1));
        assert!(!ids.contains(&2));
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn test_recommend_resolves_first_known_seed() {
        let engine = snapshot();
        assert_eq!(engine.recommend(&[999, 5], 2, 0.7), engine.recommend(&[5], 2, 0.7));
        assert!(engine.recommend(&[], 5, 0.7).is_empty());
        assert!(engine.recommend(&[999], 5, 0.7).is_empty());
        assert!(engine.recommend(&[1], 0, 0.7).is_empty());
    }

    #[test]
    fn test_huge_k_returns_every_eligible_entry() {
        let engine = snapshot();
        for k in [usize::MAX / 2 + 1, usize::MAX] {
            let ids: Vec<AnimeId> = engine.recommend(&[1], k, 0.7).iter().map(|r| r.anime_id).collect();
            assert_eq!(ids.len(), 3, "k = {k}");
            assert!(!ids.contains(&1) && !ids.contains(&2));
        }
    }

    #[test]
    fn test_similarity_is_sorted_when_lambda_is_one() {
        let engine = snapshot();
        let recs = engine.recommend(&[4], 3, 1.0);
        let sims: Vec<f64> = recs.iter().map(|r| r.similarity.unwrap()).collect();
        assert!(sims.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_seed_names() {
        let engine = snapshot();
        assert_eq!(engine.seed_names(&[3, 42, 5]), vec!["Bleach", "K-On!"]);
    }

    #[tokio::test]
    async fn test_swap_keeps_old_snapshot_alive() {
        let store = SnapshotStore::new(snapshot());
        let before = store.current().await;
        let replaced = store
            .swap(EngineSnapshot::from_entries(
                vec![entry(9, "Monster", "drama", "doctor")],
                Vec::new(),
                EngineConfig::default(),
            ))
            .await;
        assert_eq!(before.len(), 5);
        assert_eq!(replaced.len(), 5);
        assert_eq!(store.current().await.len(), 1);
    }
}
