//! Request/response shapes for the JSON API.
//!
//! Conventions:
//! - `*Request` / `*Query` → deserialized from the client; every field is
//!   optional at the serde level so that a missing field surfaces as a 400
//!   with a readable message instead of a generic decode failure
//! - `*Response` → serialized to the client
//! - Field names are camelCase on the wire

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::models::analytics::{AnalyticsPayload, AnalyticsSnapshot};
use crate::models::journal::{JournalEntry, JournalExcerpt};

pub const MAX_TEXT_CHARS: u64 = 50_000;

// ============================================================================
// Common
// ============================================================================

/// Acknowledgement for writes.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    pub success: bool,
    pub id: Uuid,
}

impl SaveResponse {
    pub fn created(id: Uuid) -> Self {
        Self { success: true, id }
    }
}

/// Returns the trimmed value or a 400 naming the field.
pub fn required(value: Option<String>, field: &str) -> AppResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

/// Accepts only fixed-width ISO dates (`YYYY-MM-DD`).
pub fn parse_date(raw: &str, field: &str) -> AppResult<NaiveDate> {
    let raw = raw.trim();
    let invalid = || AppError::Validation(format!("{field} must be a date in YYYY-MM-DD format"));
    if raw.len() != 10 {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| invalid())
}

// ============================================================================
// Journals
// ============================================================================

/// POST /api/journals
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveJournalRequest {
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,

    pub date: Option<String>,

    #[validate(length(max = 50000, message = "text must be at most 50000 characters"))]
    pub text: Option<String>,
}

/// Validated form of `SaveJournalRequest`.
#[derive(Debug)]
pub struct SaveJournal {
    pub user_id: String,
    pub date: NaiveDate,
    pub text: String,
}

impl SaveJournalRequest {
    pub fn into_command(self) -> AppResult<SaveJournal> {
        self.validate()?;
        let (user_id, date, text) = match (self.user_id, self.date, self.text) {
            (Some(u), Some(d), Some(t)) if !u.trim().is_empty() && !d.trim().is_empty() && !t.trim().is_empty() => {
                (u, d, t)
            }
            _ => {
                return Err(AppError::Validation(
                    "userId, date, and text are required".into(),
                ))
            }
        };

        Ok(SaveJournal {
            user_id: user_id.trim().to_string(),
            date: parse_date(&date, "date")?,
            text,
        })
    }
}

/// GET /api/journals
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JournalQuery {
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,

    /// Single-entry lookup when present.
    pub date: Option<String>,

    /// Skip the cache read for the list view.
    #[serde(default)]
    pub refresh: bool,
}

/// Either a single-date lookup or the full list, depending on the query.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum JournalLookupResponse {
    One { journal: Option<JournalEntry> },
    All { journals: Vec<JournalEntry> },
}

// ============================================================================
// Analytics
// ============================================================================

/// POST /api/analytics
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveAnalyticsRequest {
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,

    pub date: Option<String>,

    #[serde(rename = "analyticsJSON")]
    pub analytics_json: Option<serde_json::Value>,

    /// Number of journals the analysis covered. Default: 0
    #[validate(range(min = 0, max = 2147483647, message = "journalCount must be a non-negative integer"))]
    pub journal_count: Option<i64>,
}

#[derive(Debug)]
pub struct SaveAnalytics {
    pub user_id: String,
    pub date: NaiveDate,
    pub payload: AnalyticsPayload,
    pub journal_count: i32,
}

impl SaveAnalyticsRequest {
    pub fn into_command(self) -> AppResult<SaveAnalytics> {
        self.validate()?;
        let (Some(user_id), Some(date), Some(raw)) = (self.user_id, self.date, self.analytics_json) else {
            return Err(AppError::Validation(
                "userId, date, and analyticsJSON are required".into(),
            ));
        };
        let user_id = required(Some(user_id), "userId")?;
        let date = parse_date(&date, "date")?;

        let payload: AnalyticsPayload = serde_json::from_value(raw).map_err(|e| {
            AppError::Validation(format!("analyticsJSON does not match the analytics schema: {e}"))
        })?;
        payload
            .validate_scores()
            .map_err(|e| AppError::Validation(format!("analyticsJSON is invalid: {e}")))?;

        let journal_count = i32::try_from(self.journal_count.unwrap_or(0))
            .map_err(|_| AppError::Validation("journalCount is out of range".into()))?;

        Ok(SaveAnalytics {
            user_id,
            date,
            payload,
            journal_count,
        })
    }
}

/// GET /api/analytics and GET /api/analytics/latest
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,

    pub date: Option<String>,

    #[validate(range(min = 1, message = "limit must be at least 1"))]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum AnalyticsLookupResponse {
    One { analytics: Option<AnalyticsSnapshot> },
    All { analytics: Vec<AnalyticsSnapshot> },
}

/// POST /api/analytics/generate
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnalyticsRequest {
    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAnalyticsResponse {
    pub success: bool,
    pub id: Uuid,
    pub date: NaiveDate,
    pub journal_count: i32,
    pub analytics: AnalyticsPayload,
}

impl From<AnalyticsSnapshot> for GenerateAnalyticsResponse {
    fn from(snapshot: AnalyticsSnapshot) -> Self {
        Self {
            success: true,
            id: snapshot.id,
            date: snapshot.date,
            journal_count: snapshot.journal_count,
            analytics: snapshot.payload,
        }
    }
}

// ============================================================================
// Analyze (stateless)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExcerptInput {
    pub date: Option<String>,
    pub text: Option<String>,
}

/// POST /api/analyze
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    pub journals: Option<Vec<ExcerptInput>>,

    #[validate(length(max = 128, message = "userId must be at most 128 characters"))]
    pub user_id: Option<String>,
}

impl AnalyzeRequest {
    pub fn into_excerpts(self) -> AppResult<Vec<JournalExcerpt>> {
        self.validate()?;
        let journals = match self.journals {
            Some(journals) if !journals.is_empty() => journals,
            _ => return Err(AppError::Validation("Journals array is required".into())),
        };

        journals
            .into_iter()
            .enumerate()
            .map(|(i, j)| {
                let date = required(j.date, &format!("journals[{i}].date"))?;
                let text = required(j.text, &format!("journals[{i}].text"))?;
                if text.chars().count() as u64 > MAX_TEXT_CHARS {
                    return Err(AppError::Validation(format!(
                        "journals[{i}].text must be at most {MAX_TEXT_CHARS} characters"
                    )));
                }
                Ok(JournalExcerpt {
                    date: parse_date(&date, &format!("journals[{i}].date"))?,
                    text,
                })
            })
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analytics: AnalyticsPayload,
}

// ============================================================================
// System
// ============================================================================

/// GET /readyz
#[derive(Debug, Serialize)]
pub struct ReadyzResponse {
    pub status: &'static str,
    pub checks: ReadyzChecks,
}

#[derive(Debug, Serialize)]
pub struct ReadyzChecks {
    pub store: &'static str,
    pub cache: &'static str,
    pub analysis: &'static str,
}
