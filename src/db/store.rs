use std::future::Future;

use async_trait::async_trait;
use chrono::NaiveDate;

use super::StoreError;
use crate::models::analytics::{sort_snapshots_newest_first, AnalyticsSnapshot, NewSnapshot};
use crate::models::journal::{sort_newest_first, JournalEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOrder {
    /// Needs the `(user_id, date DESC)` index; may fail with `MissingIndex`.
    DateDesc,
    Unordered,
}

/// Journal and analytics collections, scoped per user.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Creates the entry for `(user_id, date)` or replaces its text in place.
    async fn upsert_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
        text: &str,
    ) -> Result<JournalEntry, StoreError>;

    async fn find_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError>;

    async fn query_journals(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<JournalEntry>, StoreError>;

    /// Always inserts; snapshots are never updated.
    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<AnalyticsSnapshot, StoreError>;

    /// Most recently created snapshot stamped with `date`.
    async fn find_snapshot_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AnalyticsSnapshot>, StoreError>;

    async fn query_snapshots(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

async fn sorted_or_fallback<T, Q, Fut>(
    collection: &'static str,
    sort: fn(&mut [T]),
    query: Q,
) -> Result<Vec<T>, StoreError>
where
    Q: Fn(QueryOrder) -> Fut,
    Fut: Future<Output = Result<Vec<T>, StoreError>>,
{
    match query(QueryOrder::DateDesc).await {
        Err(StoreError::MissingIndex(detail)) => {
            tracing::warn!(collection, %detail, "Sorted query unavailable, sorting in memory");
            let mut rows = query(QueryOrder::Unordered).await?;
            sort(&mut rows);
            Ok(rows)
        }
        other => other,
    }
}

/// All of a user's entries, newest date first.
pub async fn list_journals(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Vec<JournalEntry>, StoreError> {
    sorted_or_fallback("journals", sort_newest_first, |order| {
        store.query_journals(user_id, order)
    })
    .await
}

/// A user's snapshots, newest first, optionally truncated.
pub async fn list_analytics(
    store: &dyn DocumentStore,
    user_id: &str,
    limit: Option<usize>,
) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
    let mut snapshots = sorted_or_fallback("analytics", sort_snapshots_newest_first, |order| {
        store.query_snapshots(user_id, order)
    })
    .await?;

    if let Some(limit) = limit {
        snapshots.truncate(limit);
    }
    Ok(snapshots)
}

pub async fn latest_analytics(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<AnalyticsSnapshot>, StoreError> {
    Ok(list_analytics(store, user_id, Some(1)).await?.into_iter().next())
}
