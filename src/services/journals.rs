use chrono::NaiveDate;

use crate::cache::JournalCache;
use crate::db::store::{self, DocumentStore};
use crate::db::StoreError;
use crate::models::journal::JournalEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Serve from cache when possible.
    Cached,
    /// Skip the cache read; the result still repopulates the cache.
    ForceRefresh,
}

impl From<bool> for Freshness {
    fn from(refresh: bool) -> Self {
        if refresh {
            Self::ForceRefresh
        } else {
            Self::Cached
        }
    }
}

/// Upserts the entry for `(user_id, date)`. Returns only after the user's
/// cached list has been dropped, so the next list read sees the write.
pub async fn save_journal(
    store: &dyn DocumentStore,
    cache: &JournalCache,
    user_id: &str,
    date: NaiveDate,
    text: &str,
) -> Result<JournalEntry, StoreError> {
    let entry = store.upsert_journal(user_id, date, text).await?;
    cache.invalidate_journals(user_id).await;

    tracing::info!(
        user_id,
        %date,
        journal_id = %entry.id,
        updated = entry.updated_at.is_some(),
        "Journal saved"
    );
    Ok(entry)
}

pub async fn get_journal(
    store: &dyn DocumentStore,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<JournalEntry>, StoreError> {
    store.find_journal(user_id, date).await
}

/// Cache-aside list read, newest date first.
pub async fn list_journals(
    store: &dyn DocumentStore,
    cache: &JournalCache,
    user_id: &str,
    freshness: Freshness,
) -> Result<Vec<JournalEntry>, StoreError> {
    if freshness == Freshness::Cached {
        if let Some(entries) = cache.get_journals(user_id).await {
            tracing::debug!(user_id, count = entries.len(), "Journal list served from cache");
            return Ok(entries);
        }
    }

    let entries = store::list_journals(store, user_id).await?;
    cache.put_journals(user_id, &entries).await;
    tracing::debug!(user_id, count = entries.len(), ?freshness, "Journal list loaded from store");
    Ok(entries)
}
