pub mod anime;
pub mod recommendation;

pub use anime::{AnimeId, CatalogEntry, CatalogRecord, RawRecord};
pub use recommendation::{Recommendation, RecommendationResponse, SearchHit};
