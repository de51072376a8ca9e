//! Gemini narrator
//!
//! Calls the `generateContent` REST endpoint of the Generative Language API:
//! `POST {api_url}/v1beta/models/{model}:generateContent?key={api_key}`
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{AppError, AppResult};

use super::Narrator;

#[derive(Clone)]
pub struct GeminiNarrator {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize, Serialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

impl GeminiNarrator {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
        }
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_url.trim_end_matches('/'),
            model
        )
    }
}

#[async_trait::async_trait]
impl Narrator for GeminiNarrator {
    async fn generate_text(&self, prompt: &str) -> AppResult<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        tracing::debug!(model = %self.model, prompt_len = prompt.len(), "Calling Gemini");

        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::NarrationUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %error_body, "Gemini API error");
            return Err(AppError::NarrationUnavailable(format!(
                "Gemini returned {}",
                status
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| AppError::NarrationUnavailable(format!("invalid response: {}", e)))?;

        parsed
            .text()
            .ok_or_else(|| AppError::NarrationUnavailable("empty response".to_string()))
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}
