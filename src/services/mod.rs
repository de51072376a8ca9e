pub mod catalog;
pub mod core_name;
pub mod diversity;
pub mod features;
pub mod fuzzy;
pub mod narration;
pub mod recommender;
pub mod sanitize;
pub mod series_filter;
pub mod similarity;
pub mod sparse;
pub mod tfidf;
