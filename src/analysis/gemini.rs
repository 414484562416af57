use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;

use super::extract::parse_payload;
use super::prompt::build_prompt;
use super::{AnalysisGateway, GatewayError};
use crate::config::Config;
use crate::models::analytics::AnalyticsPayload;
use crate::models::journal::JournalExcerpt;

const MAX_DETAIL_CHARS: usize = 500;

pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GenerateResponse {
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts.iter().filter_map(|p| p.text.as_deref()).collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

impl GeminiGateway {
    /// `Ok(None)` when no API key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, reqwest::Error> {
        let Some(api_key) = config.gemini_api_key.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(config.analysis_timeout())
            .build()?;

        Ok(Some(Self {
            client,
            api_key,
            model: config.gemini_model.clone(),
            base_url: config.gemini_base_url.clone(),
            timeout: config.analysis_timeout(),
        }))
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    fn transport_failure(&self, e: reqwest::Error) -> GatewayError {
        if e.is_timeout() {
            GatewayError::TimedOut {
                after: self.timeout,
            }
        } else {
            GatewayError::Failed {
                detail: e.to_string(),
            }
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() <= MAX_DETAIL_CHARS {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(MAX_DETAIL_CHARS).collect();
    cut.push_str("...");
    cut
}

/// Maps a non-success model API response onto the error taxonomy.
pub fn classify_failure(status: StatusCode, body: &str) -> GatewayError {
    let detail = format!("HTTP {}: {}", status.as_u16(), truncate(body));
    let lowered = body.to_ascii_lowercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || lowered.contains("quota")
        || body.contains("RESOURCE_EXHAUSTED")
    {
        GatewayError::QuotaExceeded { detail }
    } else if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || body.contains("API_KEY_INVALID")
        || lowered.contains("api key not valid")
    {
        GatewayError::InvalidCredentials { detail }
    } else if status == StatusCode::NOT_FOUND || body.contains("NOT_FOUND") {
        GatewayError::ModelUnavailable { detail }
    } else {
        GatewayError::Failed { detail }
    }
}

#[async_trait]
impl AnalysisGateway for GeminiGateway {
    async fn analyze(&self, entries: &[JournalExcerpt]) -> Result<AnalyticsPayload, GatewayError> {
        let prompt = build_prompt(entries);
        tracing::debug!(model = %self.model, entries = entries.len(), prompt_chars = prompt.len(), "Calling analysis model");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }],
                "generationConfig": {
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await
            .map_err(|e| self.transport_failure(e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let body: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                self.transport_failure(e)
            } else {
                GatewayError::MalformedResponse {
                    detail: format!("unexpected response envelope: {e}"),
                }
            }
        })?;

        let Some(text) = body.text() else {
            let reason = body
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "empty candidate list".into());
            return Err(GatewayError::Failed {
                detail: format!("model returned no text: {reason}"),
            });
        };

        parse_payload(&text)
    }
}
