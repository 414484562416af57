use std::time::Duration;

use chrono::NaiveDate;

use super::journals::{self, Freshness};
use crate::analysis::{analyze_with_timeout, AnalysisGateway};
use crate::cache::JournalCache;
use crate::db::store::{self, DocumentStore};
use crate::db::StoreError;
use crate::error::{AppError, AppResult};
use crate::models::analytics::{AnalyticsPayload, AnalyticsSnapshot, NewSnapshot};
use crate::models::journal::JournalExcerpt;

pub async fn save_analytics(
    store: &dyn DocumentStore,
    user_id: String,
    date: NaiveDate,
    payload: AnalyticsPayload,
    journal_count: i32,
) -> Result<AnalyticsSnapshot, StoreError> {
    let snapshot = store
        .insert_snapshot(NewSnapshot {
            user_id,
            date,
            payload,
            journal_count,
        })
        .await?;

    tracing::info!(
        user_id = %snapshot.user_id,
        snapshot_id = %snapshot.id,
        journal_count,
        "Analytics snapshot saved"
    );
    Ok(snapshot)
}

/// Fetch every journal, analyze, persist one new snapshot. Nothing is
/// written unless the analysis succeeds.
pub async fn generate_analytics(
    store: &dyn DocumentStore,
    cache: &JournalCache,
    gateway: &dyn AnalysisGateway,
    user_id: &str,
    today: NaiveDate,
    analysis_timeout: Duration,
) -> AppResult<AnalyticsSnapshot> {
    // The cache may still hold a list from before a recent edit.
    let entries = journals::list_journals(store, cache, user_id, Freshness::ForceRefresh).await?;
    if entries.is_empty() {
        return Err(AppError::Validation(
            "No journal entries found. Write at least one entry before generating analytics.".into(),
        ));
    }

    let excerpts: Vec<JournalExcerpt> = entries.iter().map(JournalExcerpt::from).collect();
    let payload = analyze_with_timeout(gateway, &excerpts, analysis_timeout).await?;

    let journal_count = i32::try_from(entries.len()).unwrap_or(i32::MAX);
    let snapshot = save_analytics(store, user_id.to_string(), today, payload, journal_count).await?;
    Ok(snapshot)
}

pub async fn get_latest(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<AnalyticsSnapshot>, StoreError> {
    store::latest_analytics(store, user_id).await
}

pub async fn get_by_date(
    store: &dyn DocumentStore,
    user_id: &str,
    date: NaiveDate,
) -> Result<Option<AnalyticsSnapshot>, StoreError> {
    store.find_snapshot_by_date(user_id, date).await
}

pub async fn list(
    store: &dyn DocumentStore,
    user_id: &str,
    limit: Option<u32>,
) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
    store::list_analytics(store, user_id, limit.map(|l| l as usize)).await
}
