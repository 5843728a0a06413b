//! Recommendation types and the deterministic merge.

use serde::{Deserialize, Serialize};

/// What kind of component a recommendation proposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationKind {
    Agent,
    Skill,
}

/// Which stream produced a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationSource {
    Semantic,
    Pattern,
    Rule,
    Llm,
}

impl RecommendationSource {
    pub fn as_str(self) -> &'static str {
        match self {
            RecommendationSource::Semantic => "semantic",
            RecommendationSource::Pattern => "pattern",
            RecommendationSource::Rule => "rule",
            RecommendationSource::Llm => "llm",
        }
    }
}

impl std::fmt::Display for RecommendationSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One proposed activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub kind: RecommendationKind,
    pub name: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub reason: String,
    /// Whether the auto-activation policy may enact this without a human.
    pub auto_activate: bool,
    pub source: RecommendationSource,
}

/// Why a stream did or did not contribute to a prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "detail")]
pub enum StreamStatus {
    /// Produced this many candidate recommendations.
    Contributed(usize),
    /// Ran but produced nothing.
    Empty,
    /// Not run; the reason says why (no collaborator, below threshold...).
    Skipped(String),
    /// Missed the prediction deadline and was dropped.
    TimedOut,
    /// Errored; the prediction continued without it.
    Failed(String),
}

/// Per-stream accounting attached to a prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamReport {
    pub source: RecommendationSource,
    pub status: StreamStatus,
}

/// A full prediction: merged recommendations plus stream accounting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub recommendations: Vec<Recommendation>,
    pub streams: Vec<StreamReport>,
}

/// Merge candidate streams: group by `(kind, name)`, keep the
/// highest-confidence entry (first writer wins on exact ties), then sort by
/// confidence descending with name ascending as the tie-breaker.
pub fn merge(candidates: Vec<Recommendation>) -> Vec<Recommendation> {
    let mut best: std::collections::BTreeMap<(RecommendationKind, String), Recommendation> =
        std::collections::BTreeMap::new();
    for candidate in candidates {
        let key = (candidate.kind, candidate.name.clone());
        match best.get(&key) {
            Some(existing) if existing.confidence >= candidate.confidence => {}
            _ => {
                best.insert(key, candidate);
            }
        }
    }
    let mut merged: Vec<Recommendation> = best.into_values().collect();
    merged.sort_by(|a, b| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a.name.cmp(&b.name))
    });
    merged
}
