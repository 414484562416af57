//! Adapter between journal entries and the external text-generation model.

pub mod extract;
pub mod gemini;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;
use crate::models::analytics::AnalyticsPayload;
use crate::models::journal::JournalExcerpt;

/// Failures surfaced to callers. `Display` is the user-facing sentence;
/// `detail` carries the raw cause for debugging.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("No journal entries were provided for analysis.")]
    EmptyInput,

    #[error("Analysis is not configured. Set GEMINI_API_KEY to enable it.")]
    NotConfigured,

    #[error("API quota exceeded. Please try again later.")]
    QuotaExceeded { detail: String },

    #[error("Invalid API key. Please check GEMINI_API_KEY.")]
    InvalidCredentials { detail: String },

    #[error("Model not found. The configured analysis model might not be available.")]
    ModelUnavailable { detail: String },

    #[error("Analysis timed out. Please try again.")]
    TimedOut { after: Duration },

    #[error("The analysis response did not contain valid analytics.")]
    MalformedResponse { detail: String },

    #[error("Failed to analyze journals. Please try again.")]
    Failed { detail: String },
}

impl GatewayError {
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::EmptyInput | Self::NotConfigured => None,
            Self::QuotaExceeded { detail }
            | Self::InvalidCredentials { detail }
            | Self::ModelUnavailable { detail }
            | Self::MalformedResponse { detail }
            | Self::Failed { detail } => Some(detail.clone()),
            Self::TimedOut { after } => Some(format!("no response within {}s", after.as_secs())),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::EmptyInput => "empty_input",
            Self::NotConfigured => "not_configured",
            Self::QuotaExceeded { .. } => "quota_exceeded",
            Self::InvalidCredentials { .. } => "invalid_credentials",
            Self::ModelUnavailable { .. } => "model_unavailable",
            Self::TimedOut { .. } => "timed_out",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Text in, fixed-shape analytics out. Implementations hold no state between
/// calls and make at most one external request per call.
#[async_trait]
pub trait AnalysisGateway: Send + Sync {
    async fn analyze(&self, entries: &[JournalExcerpt]) -> Result<AnalyticsPayload, GatewayError>;
}

#[derive(Clone)]
pub enum GatewayHandle {
    Ready(Arc<dyn AnalysisGateway>),
    NotConfigured,
}

impl GatewayHandle {
    pub fn from_config(config: &Config) -> Self {
        match gemini::GeminiGateway::from_config(config) {
            Ok(Some(gateway)) => {
                tracing::info!(model = %config.gemini_model, "Analysis gateway configured");
                Self::Ready(Arc::new(gateway))
            }
            Ok(None) => {
                tracing::warn!("GEMINI_API_KEY not set, analysis endpoints disabled");
                Self::NotConfigured
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to build analysis client, analysis endpoints disabled");
                Self::NotConfigured
            }
        }
    }

    pub fn get(&self) -> Result<&dyn AnalysisGateway, GatewayError> {
        match self {
            Self::Ready(gateway) => Ok(gateway.as_ref()),
            Self::NotConfigured => Err(GatewayError::NotConfigured),
        }
    }

    pub fn is_configured(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

/// One bounded gateway call. Empty input never reaches the gateway.
pub async fn analyze_with_timeout(
    gateway: &dyn AnalysisGateway,
    entries: &[JournalExcerpt],
    limit: Duration,
) -> Result<AnalyticsPayload, GatewayError> {
    if entries.is_empty() {
        return Err(GatewayError::EmptyInput);
    }

    let started = std::time::Instant::now();
    let result = tokio::time::timeout(limit, gateway.analyze(entries))
        .await
        .unwrap_or(Err(GatewayError::TimedOut { after: limit }));

    match &result {
        Ok(_) => tracing::info!(
            entries = entries.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Journal analysis completed"
        ),
        Err(e) => tracing::warn!(
            entries = entries.len(),
            kind = e.kind(),
            detail = %e.detail().unwrap_or_default(),
            "Journal analysis failed"
        ),
    }
    result
}
