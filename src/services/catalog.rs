use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::{
    error::{AppError, AppResult},
    models::{AnimeId, CatalogEntry, CatalogRecord, RawRecord, SearchHit},
};

use super::sanitize::{sanitize_opt_f64, sanitize_text};

const UNKNOWN_NAME: &str = "Unknown";
const MISSING_TEXT: &str = "N/A";

/// Name column matched by title search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    EnglishName,
    Name,
    JapaneseNames,
}

impl SearchField {
    fn value<'a>(&self, entry: &'a CatalogEntry) -> Option<&'a str> {
        match self {
            SearchField::EnglishName => entry.english_name.as_deref(),
            SearchField::Name => Some(entry.name.as_str()),
            SearchField::JapaneseNames => entry.japanese_names.as_deref(),
        }
    }
}

/// Display fields for one title after applying raw → primary → placeholder precedence
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub name: String,
    pub score: Option<f64>,
    pub episodes: Option<f64>,
    pub genres: String,
    pub image_url: Option<String>,
    pub anime_url: Option<String>,
}

/// Immutable catalog: entries in row order plus the id → row index
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: Vec<CatalogEntry>,
    id_index: HashMap<AnimeId, usize>,
    raw: HashMap<AnimeId, RawRecord>,
}

fn missing_columns(headers: &csv::StringRecord, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|col| !headers.iter().any(|h| h.trim() == **col))
        .map(|col| col.to_string())
        .collect()
}

fn open_csv(path: &Path, required: &[&str]) -> AppResult<csv::Reader<File>> {
    let file = File::open(path)
        .map_err(|e| AppError::DataLoad(format!("cannot open {}: {}", path.display(), e)))?;
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::DataLoad(format!("cannot read header of {}: {}", path.display(), e)))?
        .clone();
    let missing = missing_columns(&headers, required);
    if !missing.is_empty() {
        return Err(AppError::DataLoad(format!(
            "{} is missing required columns: {}",
            path.display(),
            missing.join(", ")
        )));
    }

    Ok(reader)
}

/// Deserializes every row; the first bad row fails the whole file.
fn read_rows<T: DeserializeOwned>(mut reader: csv::Reader<File>, path: &Path) -> AppResult<Vec<T>> {
    reader
        .deserialize::<T>()
        .enumerate()
        .map(|(line, result)| {
            result.map_err(|e| AppError::DataLoad(format!("malformed row {} in {}: {}", line + 2, path.display(), e)))
        })
        .collect()
}

impl CatalogSnapshot {
    /// Builds a snapshot from in-memory entries; duplicate ids keep the first row.
    pub fn from_entries(entries: Vec<CatalogEntry>, raw: Vec<RawRecord>) -> Self {
        let mut unique = Vec::with_capacity(entries.len());
        let mut id_index = HashMap::with_capacity(entries.len());
        for entry in entries {
            if id_index.contains_key(&entry.anime_id) {
                tracing::warn!(anime_id = entry.anime_id, "Duplicate anime_id skipped");
                continue;
            }
            id_index.insert(entry.anime_id, unique.len());
            unique.push(entry);
        }

        let mut raw_by_id = HashMap::with_capacity(raw.len());
        for record in raw {
            if let Some(id) = record.anime_id {
                raw_by_id.entry(id).or_insert(record);
            }
        }

        Self {
            entries: unique,
            id_index,
            raw: raw_by_id,
        }
    }

    /// Loads the cleaned catalog and the raw display table.
    ///
    /// The cleaned catalog must exist and carry `anime_id` and `name`. A missing
    /// raw table only loses display fields.
    pub fn load(catalog_path: &Path, raw_path: &Path) -> AppResult<Self> {
        let reader = open_csv(catalog_path, &["anime_id", "name"])?;
        let mut entries = Vec::new();
        let mut skipped = 0usize;
        for record in read_rows::<CatalogRecord>(reader, catalog_path)? {
            match CatalogEntry::try_from(record) {
                Ok(entry) => entries.push(entry),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            tracing::warn!(skipped, "Catalog rows without a valid anime_id skipped");
        }

        let raw = if raw_path.exists() {
            let reader = open_csv(raw_path, &["anime_id"])?;
            read_rows::<RawRecord>(reader, raw_path)?
        } else {
            tracing::warn!(path = %raw_path.display(), "Raw data table not found, display fields fall back to catalog");
            Vec::new()
        };

        let snapshot = Self::from_entries(entries, raw);
        tracing::info!(
            entries = snapshot.len(),
            raw_rows = snapshot.raw.len(),
            "Catalog loaded"
        );
        Ok(snapshot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn entry(&self, row: usize) -> Option<&CatalogEntry> {
        self.entries.get(row)
    }

    pub fn row_index_of(&self, id: AnimeId) -> Option<usize> {
        self.id_index.get(&id).copied()
    }

    pub fn lookup_by_id(&self, id: AnimeId) -> Option<&CatalogEntry> {
        self.row_index_of(id).and_then(|row| self.entries.get(row))
    }

    /// Resolves display fields for a row: the raw table wins, then the
    /// cleaned catalog, then a placeholder. Values are sanitized first, so a
    /// NaN in either table counts as missing.
    pub fn display_fields(&self, row: usize) -> Option<DisplayFields> {
        let entry = self.entries.get(row)?;
        let raw = self.raw.get(&entry.anime_id);

        let name = raw
            .and_then(|r| sanitize_text(r.name.as_deref()))
            .or_else(|| sanitize_text(Some(&entry.name)))
            .or_else(|| sanitize_text(entry.english_name.as_deref()))
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());
        let score = raw
            .and_then(|r| sanitize_opt_f64(r.score))
            .or_else(|| sanitize_opt_f64(entry.score));
        let episodes = raw
            .and_then(|r| sanitize_opt_f64(r.episodes))
            .or_else(|| sanitize_opt_f64(entry.episodes));
        let genres = raw
            .and_then(|r| sanitize_text(r.genres.as_deref()))
            .or_else(|| sanitize_text(Some(&entry.genres)))
            .unwrap_or_else(|| MISSING_TEXT.to_string());

        Some(DisplayFields {
            name,
            score,
            episodes,
            genres,
            image_url: raw.and_then(|r| sanitize_text(r.image_url.as_deref())),
            anime_url: raw.and_then(|r| sanitize_text(r.anime_url.as_deref())),
        })
    }

    /// Case-insensitive substring match over the given name fields, in table
    /// order, capped at `limit`. An empty query matches nothing.
    pub fn search(&self, query: &str, fields: &[SearchField], limit: usize) -> Vec<SearchHit> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || fields.is_empty() {
            return Vec::new();
        }

        self.entries
            .iter()
            .filter(|entry| {
                fields
                    .iter()
                    .filter_map(|f| f.value(entry))
                    .any(|value| value.to_lowercase().contains(&needle))
            })
            .take(limit)
            .map(|entry| SearchHit {
                anime_id: entry.anime_id,
                name: sanitize_text(Some(&entry.name))
                    .or_else(|| sanitize_text(entry.english_name.as_deref()))
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
                image_url: self
                    .raw
                    .get(&entry.anime_id)
                    .and_then(|r| sanitize_text(r.image_url.as_deref())),
            })
            .collect()
    }
}
