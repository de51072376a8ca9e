use serde::{Deserialize, Deserializer};

use crate::services::core_name::extract_core_name;

/// Catalog key for a title
pub type AnimeId = i64;

/// Parses a numeric cell, treating unparsable text ("Unknown", "N/A") as absent.
///
/// `NaN` and `inf` parse successfully and are left for the result formatter to
/// turn into nulls.
fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| s.trim().parse::<f64>().ok()))
}

/// Parses an id cell; pandas exports ids as `123.0` when the column held nulls.
fn deserialize_lenient_id<'de, D>(deserializer: D) -> Result<Option<AnimeId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|s| {
        let s = s.trim();
        s.parse::<AnimeId>().ok().or_else(|| {
            s.parse::<f64>()
                .ok()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as AnimeId)
        })
    }))
}

/// One row of the cleaned catalog file
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogRecord {
    #[serde(deserialize_with = "deserialize_lenient_id")]
    pub anime_id: Option<AnimeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub english_name: Option<String>,
    #[serde(default)]
    pub japanese_names: Option<String>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub themes: Option<String>,
    #[serde(default)]
    pub demographics: Option<String>,
    #[serde(default)]
    pub studios: Option<String>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub episodes: Option<f64>,
}

/// One row of the raw catalog file; its values win for display
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
    #[serde(deserialize_with = "deserialize_lenient_id")]
    pub anime_id: Option<AnimeId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub score: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_lenient_f64")]
    pub episodes: Option<f64>,
    #[serde(default)]
    pub genres: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub anime_url: Option<String>,
}

/// A title in the catalog snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub anime_id: AnimeId,
    pub name: String,
    pub english_name: Option<String>,
    pub japanese_names: Option<String>,
    /// Comma-joined lowercase tokens, possibly empty
    pub genres: String,
    pub themes: String,
    pub demographics: String,
    pub studios: String,
    pub synopsis: String,
    pub score: Option<f64>,
    pub episodes: Option<f64>,
    /// Series key; never shown to users
    pub core_name: String,
}

impl CatalogEntry {
    /// Builds an entry, deriving `core_name` from `name`
    pub fn new(anime_id: AnimeId, name: impl Into<String>) -> Self {
        let name = name.into();
        let core_name = extract_core_name(&name);
        Self {
            anime_id,
            name,
            english_name: None,
            japanese_names: None,
            genres: String::new(),
            themes: String::new(),
            demographics: String::new(),
            studios: String::new(),
            synopsis: String::new(),
            score: None,
            episodes: None,
            core_name,
        }
    }

    /// Individual genre tags, trimmed, empties dropped
    pub fn genre_tags(&self) -> impl Iterator<Item = &str> {
        self.genres.split(',').map(str::trim).filter(|g| !g.is_empty())
    }
}

impl TryFrom<CatalogRecord> for CatalogEntry {
    type Error = CatalogRecord;

    /// Fails (returning the record) when the row has no usable id
    fn try_from(record: CatalogRecord) -> Result<Self, Self::Error> {
        let Some(anime_id) = record.anime_id else {
            return Err(record);
        };

        let mut entry = CatalogEntry::new(anime_id, record.name.unwrap_or_default());
        entry.english_name = record.english_name.filter(|s| !s.trim().is_empty());
        entry.japanese_names = record.japanese_names.filter(|s| !s.trim().is_empty());
        entry.genres = record.genres.unwrap_or_default();
        entry.themes = record.themes.unwrap_or_default();
        entry.demographics = record.demographics.unwrap_or_default();
        entry.studios = record.studios.unwrap_or_default();
        entry.synopsis = record.synopsis.unwrap_or_default();
        entry.score = record.score;
        entry.episodes = record.episodes;
        Ok(entry)
    }
}
