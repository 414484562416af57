//! In-memory fakes for the store, cache and gateway seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::analysis::{AnalysisGateway, GatewayError, GatewayHandle};
use crate::cache::{CacheBackend, CacheError, JournalCache};
use crate::config::Config;
use crate::db::store::{DocumentStore, QueryOrder};
use crate::db::{StoreError, StoreHandle};
use crate::models::analytics::*;
use crate::models::journal::{sort_newest_first, JournalEntry, JournalExcerpt};
use crate::rate_limit::RateLimitState;
use crate::AppState;

// ============================================================================
// Store
// ============================================================================

/// Document store kept in process memory. Unordered queries return rows in
/// insertion order, like a collection scan.
pub struct MemoryStore {
    journals: Mutex<Vec<JournalEntry>>,
    snapshots: Mutex<Vec<AnalyticsSnapshot>>,
    sort_index: bool,
    journal_queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            journals: Mutex::new(Vec::new()),
            snapshots: Mutex::new(Vec::new()),
            sort_index: true,
            journal_queries: AtomicUsize::new(0),
        }
    }

    /// Rejects `DateDesc` queries the way a store missing its composite
    /// index does.
    pub fn without_sort_index() -> Self {
        Self {
            sort_index: false,
            ..Self::new()
        }
    }

    /// Journal list queries that reached the store, counting fallbacks once.
    pub fn journal_queries(&self) -> usize {
        self.journal_queries.load(Ordering::SeqCst)
    }

    fn check_order(&self, order: QueryOrder) -> Result<(), StoreError> {
        if order == QueryOrder::DateDesc && !self.sort_index {
            return Err(StoreError::MissingIndex("no (user_id, date DESC) index".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
        text: &str,
    ) -> Result<JournalEntry, StoreError> {
        let mut journals = self.journals.lock().await;
        if let Some(existing) = journals
            .iter_mut()
            .find(|e| e.user_id == user_id && e.date == date)
        {
            existing.text = text.to_string();
            existing.updated_at = Some(Utc::now());
            return Ok(existing.clone());
        }

        let entry = JournalEntry {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            date,
            text: text.to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        journals.push(entry.clone());
        Ok(entry)
    }

    async fn find_journal(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<JournalEntry>, StoreError> {
        let journals = self.journals.lock().await;
        Ok(journals
            .iter()
            .find(|e| e.user_id == user_id && e.date == date)
            .cloned())
    }

    async fn query_journals(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<JournalEntry>, StoreError> {
        self.check_order(order)?;
        self.journal_queries.fetch_add(1, Ordering::SeqCst);

        let journals = self.journals.lock().await;
        let mut rows: Vec<JournalEntry> = journals
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        if order == QueryOrder::DateDesc {
            sort_newest_first(&mut rows);
        }
        Ok(rows)
    }

    async fn insert_snapshot(&self, snapshot: NewSnapshot) -> Result<AnalyticsSnapshot, StoreError> {
        let stored = AnalyticsSnapshot {
            id: Uuid::new_v4(),
            user_id: snapshot.user_id,
            date: snapshot.date,
            payload: snapshot.payload,
            journal_count: snapshot.journal_count,
            created_at: Utc::now(),
        };
        self.snapshots.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn find_snapshot_by_date(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Option<AnalyticsSnapshot>, StoreError> {
        let snapshots = self.snapshots.lock().await;
        // max_by_key keeps the last maximum, so later inserts win ties.
        Ok(snapshots
            .iter()
            .filter(|s| s.user_id == user_id && s.date == date)
            .max_by_key(|s| s.created_at)
            .cloned())
    }

    async fn query_snapshots(
        &self,
        user_id: &str,
        order: QueryOrder,
    ) -> Result<Vec<AnalyticsSnapshot>, StoreError> {
        self.check_order(order)?;

        let snapshots = self.snapshots.lock().await;
        let mut rows: Vec<AnalyticsSnapshot> = snapshots
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        if order == QueryOrder::DateDesc {
            sort_snapshots_newest_first(&mut rows);
        }
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ============================================================================
// Cache
// ============================================================================

/// Test clock that only moves when told to.
#[derive(Clone, Default)]
pub struct ManualClock {
    elapsed: Arc<StdMutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        *self.elapsed.lock().unwrap()
    }

    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock().unwrap() += by;
    }
}

/// Key-value cache with per-key expiry measured on a `ManualClock`.
pub struct MemoryCache {
    clock: ManualClock,
    entries: StdMutex<HashMap<String, (String, Duration)>>,
}

impl MemoryCache {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            entries: StdMutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.now();
        let entries = self.entries.lock().unwrap();
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| now < *expires_at)
            .map(|(value, _)| value.clone()))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A backend that is down: every call errors or never completes.
pub struct FailingCache {
    hang: bool,
}

impl FailingCache {
    pub fn erroring() -> Self {
        Self { hang: false }
    }

    pub fn hanging() -> Self {
        Self { hang: true }
    }

    async fn fail<T>(&self) -> Result<T, CacheError> {
        if self.hang {
            std::future::pending::<()>().await;
        }
        Err(CacheError::Backend("connection refused".into()))
    }
}

#[async_trait]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        self.fail().await
    }

    async fn set_ex(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
        self.fail().await
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        self.fail().await
    }
}

/// A journal cache over `MemoryCache` with the production TTL.
pub fn memory_cache() -> (JournalCache, Arc<MemoryCache>, ManualClock) {
    let clock = ManualClock::new();
    let backend = Arc::new(MemoryCache::new(clock.clone()));
    let cache = JournalCache::new(
        backend.clone(),
        Duration::from_secs(300),
        Duration::from_secs(1),
    );
    (cache, backend, clock)
}

// ============================================================================
// Gateway
// ============================================================================

type FailureFn = Box<dyn Fn() -> GatewayError + Send + Sync>;

pub struct StubGateway {
    outcome: Result<AnalyticsPayload, FailureFn>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_input: Mutex<Vec<JournalExcerpt>>,
}

impl StubGateway {
    pub fn returning(payload: AnalyticsPayload) -> Self {
        Self::with_outcome(Ok(payload))
    }

    pub fn failing(error: impl Fn() -> GatewayError + Send + Sync + 'static) -> Self {
        Self::with_outcome(Err(Box::new(error)))
    }

    fn with_outcome(outcome: Result<AnalyticsPayload, FailureFn>) -> Self {
        Self {
            outcome,
            delay: None,
            calls: AtomicUsize::new(0),
            last_input: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn last_input(&self) -> Vec<JournalExcerpt> {
        self.last_input.lock().await.clone()
    }
}

#[async_trait]
impl AnalysisGateway for StubGateway {
    async fn analyze(&self, entries: &[JournalExcerpt]) -> Result<AnalyticsPayload, GatewayError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().await = entries.to_vec();
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.outcome {
            Ok(payload) => Ok(payload.clone()),
            Err(make_error) => Err(make_error()),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn metric(score: u8, trend: Trend) -> SignalMetric {
    SignalMetric {
        score,
        trend,
        summary: format!("Observed at {score}."),
        relative_to_baseline: f64::from(score) - 50.0,
    }
}

pub fn sample_payload() -> AnalyticsPayload {
    AnalyticsPayload {
        cognitive_performance: CognitivePerformance {
            cognitive_clarity: metric(72, Trend::Improving),
            decision_fatigue: metric(40, Trend::Stable),
            cognitive_load: metric(55, Trend::Declining),
        },
        emotional_regulation: EmotionalRegulation {
            emotional_volatility: metric(30, Trend::Stable),
            emotional_recovery: metric(65, Trend::Improving),
        },
        motivation_engagement: MotivationEngagement {
            intrinsic_motivation: metric(70, Trend::Stable),
            purpose_drift: metric(20, Trend::Stable),
        },
        communication_social: CommunicationSocial {
            social_load: metric(45, Trend::Declining),
            assertiveness_balance: metric(60, Trend::Stable),
        },
        time_attention: TimeAttention {
            time_scarcity: metric(80, Trend::Declining),
            context_switching: metric(75, Trend::Declining),
        },
        self_relationship: SelfRelationship {
            self_compassion_criticism: metric(50, Trend::Stable),
            agency: metric(68, Trend::Improving),
        },
        growth_learning: GrowthLearning {
            learning_momentum: metric(62, Trend::Improving),
            adaptability: metric(58, Trend::Stable),
        },
        pattern_awareness: PatternAwareness {
            language_echoes: metric(35, Trend::Stable),
            pressure_blind_spots: metric(25, Trend::Stable),
        },
    }
}

/// App state over in-memory fakes. Pass `None` for a missing gateway.
pub fn test_state(
    store: Arc<MemoryStore>,
    gateway: Option<Arc<StubGateway>>,
) -> AppState {
    let config = Config::default();
    let (cache, _, _) = memory_cache();
    AppState {
        store: StoreHandle::Ready(store),
        cache,
        gateway: match gateway {
            Some(gateway) => GatewayHandle::Ready(gateway),
            None => GatewayHandle::NotConfigured,
        },
        rate_limiter: RateLimitState::new(
            config.analyze_rate_limit_per_min,
            Duration::from_secs(60),
        ),
        config: Arc::new(config),
    }
}
