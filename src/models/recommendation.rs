use serde::{Deserialize, Serialize};

use super::AnimeId;

/// A search match returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchHit {
    pub anime_id: AnimeId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A recommended title with display fields resolved and sanitized
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub anime_id: AnimeId,
    pub name: String,
    /// Cosine similarity to the seed title
    pub similarity: Option<f64>,
    pub score: Option<f64>,
    pub episodes: Option<f64>,
    pub genres: String,
    pub image_url: Option<String>,
    pub anime_url: Option<String>,
    /// Narrated explanation, present only when narration was requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Response body for the recommendations endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recommendations: Vec<Recommendation>,
}
