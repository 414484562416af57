use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::store::{DocumentStore, QueryOrder};
use super::StoreError;
use crate::models::analytics::{AnalyticsPayload, AnalyticsSnapshot, NewSnapshot};
use crate::models::journal::JournalEntry;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct SnapshotRow {
    id: Uuid,
    user_id: String,
    snapshot_date: NaiveDate,
    payload: Json<AnalyticsPayload>,
    journal_count: i32,
    created_at: DateTime<Utc>,
}

impl From<SnapshotRow> for AnalyticsSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            date: row.snapshot_date,
            payload: row.payload.0,
            journal_count: row.journal_count,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn upsert_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
        text: &str,
    ) -> Result<JournalEntry, StoreError> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            r#"
            INSERT INTO journals (id, user_id, entry_date, text, created_at)
            VALUES ($1, $2, $3, $4, NOW())
            ON CONFLICT (user_id, entry_date) DO UPDATE SET
                text = EXCLUDED.text,
                updated_at = NOW()
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(date)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn find_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let entry = sqlx::query_as::<_, JournalEntry>(
            "SELECT * FROM journals WHERE user_id = $1 AND entry_date = $2",
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn query_journals(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        let sql = match order {
            QueryOrder::DateDesc => {
                "SELECT * FROM journals WHERE user_id = $1 ORDER BY entry_date DESC"
            }
            QueryOrder::Unordered => "SELECT * FROM journals WHERE user_id = $1",
        };

        let entries = sqlx::query_as::<_, JournalEntry>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(entries)
    }

    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<AnalyticsSnapshot, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            INSERT INTO analytics_snapshots (id, user_id, snapshot_date, payload, journal_count, created_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&snapshot.user_id)
        .bind(snapshot.date)
        .bind(Json(&snapshot.payload))
        .bind(snapshot.journal_count)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn find_snapshot_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AnalyticsSnapshot>, StoreError> {
        let row = sqlx::query_as::<_, SnapshotRow>(
            r#"
            SELECT * FROM analytics_snapshots
            WHERE user_id = $1 AND snapshot_date = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn query_snapshots(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
        let sql = match order {
            QueryOrder::DateDesc => {
                r#"
                SELECT * FROM analytics_snapshots
                WHERE user_id = $1
                ORDER BY snapshot_date DESC, created_at DESC
                "#
            }
            QueryOrder::Unordered => "SELECT * FROM analytics_snapshots WHERE user_id = $1",
        };

        let rows = sqlx::query_as::<_, SnapshotRow>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}
