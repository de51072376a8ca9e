//! Narration collaborator
//!
//! Wraps an external text-generation service. Narration is layered on top of a
//! finished recommendation list: a failing narrator degrades to a placeholder
//! summary per item and never fails the recommendation itself.
use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::Recommendation,
};

pub mod gemini;

pub use gemini::GeminiNarrator;

/// Text-generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Narrator: Send + Sync {
    /// Generates a reply for `prompt`
    ///
    /// Fails with `NarrationUnavailable` when the service is unconfigured or errors.
    async fn generate_text(&self, prompt: &str) -> AppResult<String>;

    /// Narrator name for logging
    fn name(&self) -> &'static str;
}

/// Narrator used when no credential is configured
pub struct DisabledNarrator;

#[async_trait::async_trait]
impl Narrator for DisabledNarrator {
    async fn generate_text(&self, _prompt: &str) -> AppResult<String> {
        Err(AppError::NarrationUnavailable(
            "GEMINI_API_KEY is not configured".to_string(),
        ))
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Picks the narrator the configuration allows
pub fn narrator_from_config(config: &Config) -> Arc<dyn Narrator> {
    match config.gemini_api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            tracing::info!(model = %config.gemini_model, "Gemini narration enabled");
            Arc::new(GeminiNarrator::new(
                key.to_string(),
                config.gemini_api_url.clone(),
                config.gemini_model.clone(),
            ))
        }
        _ => {
            tracing::warn!("GEMINI_API_KEY not set, narration disabled");
            Arc::new(DisabledNarrator)
        }
    }
}

/// Prompt asking why `title` suits someone who enjoyed `seed_names`
pub fn recommendation_prompt(seed_names: &[String], title: &str) -> String {
    format!(
        "The user enjoys these anime: {}.\nExplain in 2-3 sentences why they might also enjoy '{}', \
         and what themes, characters, or tone it shares.",
        seed_names.join(", "),
        title
    )
}

/// Placeholder stored in `summary` when narration of one item fails
pub fn summary_placeholder(error: &AppError) -> String {
    format!("(Error getting summary: {})", error)
}

/// Fills `summary` on every recommendation, one concurrent task per item.
///
/// Failures (including task panics) become a per-item placeholder.
pub async fn narrate_recommendations(
    narrator: Arc<dyn Narrator>,
    seed_names: &[String],
    recommendations: Vec<Recommendation>,
) -> Vec<Recommendation> {
    let mut tasks = Vec::with_capacity(recommendations.len());

    for rec in &recommendations {
        let narrator = narrator.clone();
        let prompt = recommendation_prompt(seed_names, &rec.name);
        let task = tokio::spawn(async move { narrator.generate_text(&prompt).await });
        tasks.push(task);
    }

    let mut narrated = Vec::with_capacity(recommendations.len());
    let mut failures = 0usize;

    for (mut rec, task) in recommendations.into_iter().zip(tasks) {
        let summary = match task.await {
            Ok(Ok(text)) => text.trim().to_string(),
            Ok(Err(e)) => {
                failures += 1;
                tracing::warn!(anime_id = rec.anime_id, error = %e, "Narration failed");
                summary_placeholder(&e)
            }
            Err(e) => {
                failures += 1;
                tracing::error!(error = %e, "Narration task join error");
                summary_placeholder(&AppError::Internal(e.to_string()))
            }
        };
        rec.summary = Some(summary);
        narrated.push(rec);
    }

    if failures > 0 {
        tracing::warn!(
            narrator = narrator.name(),
            success_count = narrated.len() - failures,
            error_count = failures,
            "Partial narration failure"
        );
    }

    narrated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(id: i64, name: &str) -> Recommendation {
        Recommendation {
            anime_id: id,
            name: name.to_string(),
            similarity: Some(0.9),
            score: None,
            episodes: None,
            genres: "action".to_string(),
            image_url: None,
            anime_url: None,
            summary: None,
        }
    }

    #[test]
    fn test_prompt_mentions_seeds_and_title() {
        let prompt = recommendation_prompt(&["Naruto".to_string(), "Bleach".to_string()], "Hunter x Hunter");
        assert!(prompt.contains("Naruto, Bleach"));
        assert!(prompt.contains("'Hunter x Hunter'"));
    }

    #[tokio::test]
    async fn test_disabled_narrator_is_unavailable() {
        let result = DisabledNarrator.generate_text("hi").await;
        assert!(matches!(result, Err(AppError::NarrationUnavailable(_))));
    }

    #[tokio::test]
    async fn test_narrate_fills_summaries() {
        let mut mock = MockNarrator::new();
        mock.expect_generate_text()
            .times(2)
            .returning(|_| Ok("  A great pick.  ".to_string()));
        mock.expect_name().return_const("mock");

        let narrated = narrate_recommendations(
            Arc::new(mock),
            &["Naruto".to_string()],
            vec![rec(1, "Bleach"), rec(2, "One Piece")],
        )
        .await;

        assert_eq!(narrated.len(), 2);
        assert!(narrated.iter().all(|r| r.summary.as_deref() == Some("A great pick.")));
        assert_eq!(narrated[1].anime_id, 2);
    }

    #[tokio::test]
    async fn test_narration_failure_degrades_per_item() {
        let mut mock = MockNarrator::new();
        mock.expect_generate_text().returning(|prompt| {
            if prompt.contains("'Bleach'") {
                Err(AppError::NarrationUnavailable("quota".to_string()))
            } else {
                Ok("Fine.".to_string())
            }
        });
        mock.expect_name().return_const("mock");

        let narrated = narrate_recommendations(
            Arc::new(mock),
            &["Naruto".to_string()],
            vec![rec(1, "Bleach"), rec(2, "Monster")],
        )
        .await;

        let first = narrated[0].summary.as_deref().unwrap();
        assert!(first.starts_with("(Error getting summary:"));
        assert!(first.contains("quota"));
        assert_eq!(narrated[1].summary.as_deref(), Some("Fine."));
    }

    #[test]
    fn test_config_without_key_disables_narration() {
        let config = Config::with_paths("a.csv", "b.csv");
        assert_eq!(narrator_from_config(&config).name(), "disabled");
    }
}
