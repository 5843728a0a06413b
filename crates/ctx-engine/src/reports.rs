//! Structured operation reports.
//!
//! Cross-component operations either complete atomically or return one of
//! these reports enumerating exactly what was applied, what was skipped,
//! and what failed. Nothing here is a process-level error; partial success
//! is a first-class result.

use ctx_intel::RecommendationKind;
use ctx_ratings::{SkillQualityMetrics, SkillRating};
use serde::{Deserialize, Serialize};

/// A single failed step inside a larger operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepError {
    pub name: String,
    pub message: String,
}

/// Outcome of an activation, including the dependency closure for agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivationReport {
    /// Names activated by this call, dependency-first.
    pub activated: Vec<String>,
    /// Closure members that were already active.
    pub already_active: Vec<String>,
    /// The step that failed, if any; activation short-circuits on the first
    /// failure, so everything in `activated` happened before it.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<StepError>,
}

impl ActivationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Outcome of a deactivation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeactivationReport {
    pub deactivated: Vec<String>,
    /// Forced deactivations leave dependents broken; each one is named.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// What happened to one considered recommendation during auto-activation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoActivationOutcome {
    pub name: String,
    pub kind: RecommendationKind,
    pub confidence: f64,
    /// Row id in the recommendations table, when persistence succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation_id: Option<String>,
    pub applied: bool,
    /// Why the recommendation was or was not applied.
    pub detail: String,
}

/// Outcome of one auto-activation cycle. Failures on one recommendation
/// never abort the rest.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutoActivationReport {
    pub outcomes: Vec<AutoActivationOutcome>,
}

impl AutoActivationReport {
    /// Number of recommendations considered.
    pub fn considered(&self) -> usize {
        self.outcomes.len()
    }

    /// Names actually activated.
    pub fn applied(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| o.applied)
            .map(|o| o.name.as_str())
            .collect()
    }
}

/// A skill's metrics plus its most recent reviews.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRatingsView {
    pub metrics: SkillQualityMetrics,
    pub recent_reviews: Vec<SkillRating>,
}

/// One resolved skill dependency.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSkillDependency {
    pub name: String,
    pub spec: String,
    pub resolved_version: String,
}
