use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category and metric keys of the analytics document, in display order.
/// The prompt schema and `AnalyticsPayload::metrics` both follow this list.
pub const METRIC_CATALOG: &[(&str, &[&str])] = &[
    (
        "cognitivePerformance",
        &["cognitiveClarity", "decisionFatigue", "cognitiveLoad"],
    ),
    ("emotionalRegulation", &["emotionalVolatility", "emotionalRecovery"]),
    ("motivationEngagement", &["intrinsicMotivation", "purposeDrift"]),
    ("communicationSocial", &["socialLoad", "assertivenessBalance"]),
    ("timeAttention", &["timeScarcity", "contextSwitching"]),
    ("selfRelationship", &["selfCompassionCriticism", "agency"]),
    ("growthLearning", &["learningMomentum", "adaptability"]),
    ("patternAwareness", &["languageEchoes", "pressureBlindSpots"]),
];

pub const MAX_SCORE: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improving,
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalMetric {
    /// 0-100, relative to the writer's own history.
    pub score: u8,
    pub trend: Trend,
    pub summary: String,
    /// Signed percentage change from the writer's baseline.
    pub relative_to_baseline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CognitivePerformance {
    pub cognitive_clarity: SignalMetric,
    pub decision_fatigue: SignalMetric,
    pub cognitive_load: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionalRegulation {
    pub emotional_volatility: SignalMetric,
    pub emotional_recovery: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotivationEngagement {
    pub intrinsic_motivation: SignalMetric,
    pub purpose_drift: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunicationSocial {
    pub social_load: SignalMetric,
    pub assertiveness_balance: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeAttention {
    pub time_scarcity: SignalMetric,
    pub context_switching: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelfRelationship {
    pub self_compassion_criticism: SignalMetric,
    pub agency: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthLearning {
    pub learning_momentum: SignalMetric,
    pub adaptability: SignalMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAwareness {
    pub language_echoes: SignalMetric,
    pub pressure_blind_spots: SignalMetric,
}

/// The fixed analytics document: eight categories, seventeen metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsPayload {
    pub cognitive_performance: CognitivePerformance,
    pub emotional_regulation: EmotionalRegulation,
    pub motivation_engagement: MotivationEngagement,
    pub communication_social: CommunicationSocial,
    pub time_attention: TimeAttention,
    pub self_relationship: SelfRelationship,
    pub growth_learning: GrowthLearning,
    pub pattern_awareness: PatternAwareness,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{category}.{metric} score {score} is outside 0-{MAX_SCORE}")]
pub struct ScoreOutOfRange {
    pub category: &'static str,
    pub metric: &'static str,
    pub score: u8,
}

impl AnalyticsPayload {
    /// Every metric as `(category, metric, value)`, in catalog order.
    pub fn metrics(&self) -> Vec<(&'static str, &'static str, &SignalMetric)> {
        let cp = &self.cognitive_performance;
        let er = &self.emotional_regulation;
        let me = &self.motivation_engagement;
        let cs = &self.communication_social;
        let ta = &self.time_attention;
        let sr = &self.self_relationship;
        let gl = &self.growth_learning;
        let pa = &self.pattern_awareness;

        vec![
            ("cognitivePerformance", "cognitiveClarity", &cp.cognitive_clarity),
            ("cognitivePerformance", "decisionFatigue", &cp.decision_fatigue),
            ("cognitivePerformance", "cognitiveLoad", &cp.cognitive_load),
            ("emotionalRegulation", "emotionalVolatility", &er.emotional_volatility),
            ("emotionalRegulation", "emotionalRecovery", &er.emotional_recovery),
            ("motivationEngagement", "intrinsicMotivation", &me.intrinsic_motivation),
            ("motivationEngagement", "purposeDrift", &me.purpose_drift),
            ("communicationSocial", "socialLoad", &cs.social_load),
            ("communicationSocial", "assertivenessBalance", &cs.assertiveness_balance),
            ("timeAttention", "timeScarcity", &ta.time_scarcity),
            ("timeAttention", "contextSwitching", &ta.context_switching),
            ("selfRelationship", "selfCompassionCriticism", &sr.self_compassion_criticism),
            ("selfRelationship", "agency", &sr.agency),
            ("growthLearning", "learningMomentum", &gl.learning_momentum),
            ("growthLearning", "adaptability", &gl.adaptability),
            ("patternAwareness", "languageEchoes", &pa.language_echoes),
            ("patternAwareness", "pressureBlindSpots", &pa.pressure_blind_spots),
        ]
    }

    /// Serde already pins the shape; this checks the value ranges.
    pub fn validate_scores(&self) -> Result<(), ScoreOutOfRange> {
        match self
            .metrics()
            .into_iter()
            .find(|(_, _, metric)| metric.score > MAX_SCORE)
        {
            Some((category, metric, value)) => Err(ScoreOutOfRange {
                category,
                metric,
                score: value.score,
            }),
            None => Ok(()),
        }
    }
}

/// An immutable record of one analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    pub id: Uuid,
    pub user_id: String,
    /// The day the snapshot was generated.
    pub date: NaiveDate,
    #[serde(rename = "analyticsJSON")]
    pub payload: AnalyticsPayload,
    pub journal_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSnapshot {
    pub user_id: String,
    pub date: NaiveDate,
    pub payload: AnalyticsPayload,
    pub journal_count: i32,
}

/// Newest snapshot date first; same-day snapshots by creation time.
pub fn sort_snapshots_newest_first(snapshots: &mut [AnalyticsSnapshot]) {
    snapshots.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}
