//! Row types for ratings, recommendations, and derived metrics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user's rating of a skill, one row per `(skill_name, user_hash)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillRating {
    pub skill_name: String,
    /// Anonymous SHA-256 of a stable user identifier; raw identity never
    /// reaches this crate.
    pub user_hash: String,
    pub stars: u8,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review: Option<String>,
    pub was_helpful: bool,
    pub task_succeeded: bool,
}

/// A rating being submitted; the store stamps the timestamp.
#[derive(Debug, Clone)]
pub struct RatingSubmission {
    pub skill_name: String,
    pub user_hash: String,
    pub stars: u8,
    pub project_type: Option<String>,
    pub review: Option<String>,
    pub was_helpful: bool,
    pub task_succeeded: bool,
}

/// Aggregated per-skill quality metrics, recomputed inside the same
/// transaction as every rating write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillQualityMetrics {
    pub skill_name: String,
    pub avg_rating: f64,
    pub total_ratings: i64,
    pub helpful_percentage: f64,
    pub success_correlation_percentage: f64,
    /// Never computed; the upstream formula for this figure is unspecified,
    /// so the column is carried but stays null.
    pub token_efficiency_percentage: Option<f64>,
    pub usage_count: i64,
    pub last_updated: DateTime<Utc>,
}

/// A surfaced recommendation and what became of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub context_hash: String,
    /// Component name; agents and skills share this column.
    pub skill_name: String,
    pub confidence: f64,
    pub reason: String,
    pub source: String,
    pub auto_activate: bool,
    pub was_accepted: Option<bool>,
    pub was_applied: Option<bool>,
}

/// A recommendation being persisted; the store assigns id and timestamp.
#[derive(Debug, Clone)]
pub struct NewRecommendation {
    pub context_hash: String,
    pub skill_name: String,
    pub confidence: f64,
    pub reason: String,
    pub source: String,
    pub auto_activate: bool,
}

/// Export formats supported by [`crate::RatingsDb::export`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl std::str::FromStr for ExportFormat {
    type Err = crate::errors::RatingsError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(crate::errors::RatingsError::UnknownFormat(other.to_string())),
        }
    }
}
