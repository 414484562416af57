use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One free-text entry per user per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JournalEntry {
    pub id: Uuid,
    pub user_id: String,
    #[sqlx(rename = "entry_date")]
    pub date: NaiveDate,
    pub text: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// The slice of an entry the analysis gateway sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalExcerpt {
    pub date: NaiveDate,
    pub text: String,
}

impl From<&JournalEntry> for JournalExcerpt {
    fn from(entry: &JournalEntry) -> Self {
        Self {
            date: entry.date,
            text: entry.text.clone(),
        }
    }
}

/// Orders entries newest date first. Dates are unique per user, so the
/// order is total within one user's list.
pub fn sort_newest_first(entries: &mut [JournalEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}
