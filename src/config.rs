use serde::Deserialize;
use std::path::PathBuf;

use crate::services::catalog::SearchField;
use crate::services::recommender::EngineConfig;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Cleaned catalog CSV consumed by the engine
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Raw catalog CSV holding display fields (image/anime URLs)
    #[serde(default = "default_raw_data_path")]
    pub raw_data_path: PathBuf,

    /// Size of the nearest-neighbor candidate pool
    #[serde(default = "default_candidates")]
    pub default_candidates: usize,

    /// Maximum results sharing a single genre
    #[serde(default = "default_max_per_genre")]
    pub max_per_genre: usize,

    /// Relevance/diversity trade-off used when the request omits one
    #[serde(default = "default_lambda")]
    pub default_lambda: f64,

    /// Result count used when the request omits one
    #[serde(default = "default_k")]
    pub default_k: usize,

    /// Maximum number of search hits
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Name columns matched by search, in order
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<SearchField>,

    /// Gemini API key; narration is disabled without it
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    #[serde(default = "default_gemini_api_url")]
    pub gemini_api_url: String,

    /// Directory served as the router fallback (frontend build)
    #[serde(default)]
    pub static_dir: Option<PathBuf>,

    /// Chat turns (user line plus reply) kept per session
    #[serde(default = "default_chat_history_turns")]
    pub chat_history_turns: usize,

    /// Chat sessions held at once; least recently used are evicted first
    #[serde(default = "default_chat_max_sessions")]
    pub chat_max_sessions: u64,

    /// Seconds without a message before a chat session is dropped
    #[serde(default = "default_chat_session_idle_secs")]
    pub chat_session_idle_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("data/cleaned_data.csv")
}

fn default_raw_data_path() -> PathBuf {
    PathBuf::from("data/raw_data.csv")
}

fn default_candidates() -> usize {
    100
}

fn default_max_per_genre() -> usize {
    3
}

fn default_lambda() -> f64 {
    0.7
}

fn default_k() -> usize {
    10
}

fn default_search_limit() -> usize {
    10
}

fn default_search_fields() -> Vec<SearchField> {
    vec![
        SearchField::EnglishName,
        SearchField::Name,
        SearchField::JapaneseNames,
    ]
}

fn default_chat_history_turns() -> usize {
    10
}

fn default_chat_max_sessions() -> u64 {
    10_000
}

fn default_chat_session_idle_secs() -> u64 {
    1800
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_api_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// Configuration with every default applied, pointed at the given catalog files
    pub fn with_paths(catalog_path: impl Into<PathBuf>, raw_data_path: impl Into<PathBuf>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            catalog_path: catalog_path.into(),
            raw_data_path: raw_data_path.into(),
            default_candidates: default_candidates(),
            max_per_genre: default_max_per_genre(),
            default_lambda: default_lambda(),
            default_k: default_k(),
            search_limit: default_search_limit(),
            search_fields: default_search_fields(),
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            gemini_api_url: default_gemini_api_url(),
            static_dir: None,
            chat_history_turns: default_chat_history_turns(),
            chat_max_sessions: default_chat_max_sessions(),
            chat_session_idle_secs: default_chat_session_idle_secs(),
        }
    }

    /// Engine tuning derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            default_candidates: self.default_candidates,
            max_per_genre: self.max_per_genre,
            search_fields: self.search_fields.clone(),
            ..EngineConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_paths_applies_defaults() {
        let config = Config::with_paths("a.csv", "b.csv");
        assert_eq!(config.catalog_path, PathBuf::from("a.csv"));
        assert_eq!(config.default_candidates, 100);
        assert_eq!(config.max_per_genre, 3);
        assert!((config.default_lambda - 0.7).abs() < f64::EPSILON);
        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.chat_history_turns, 10);
        assert_eq!(config.chat_session_idle_secs, 1800);
    }

    #[test]
    fn test_search_fields_deserialize_from_comma_list() {
        let vars = vec![("SEARCH_FIELDS".to_string(), "name,english_name".to_string())];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(
            config.search_fields,
            vec![SearchField::Name, SearchField::EnglishName]
        );
    }

    #[test]
    fn test_engine_config_carries_tuning() {
        let mut config = Config::with_paths("a.csv", "b.csv");
        config.default_candidates = 25;
        config.max_per_genre = 2;
        let engine = config.engine_config();
        assert_eq!(engine.default_candidates, 25);
        assert_eq!(engine.max_per_genre, 2);
    }
}
