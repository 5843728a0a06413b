//! SQLite-backed skill ratings and recommendation persistence.
//!
//! One database holds three tables: `ratings` (one row per skill/user
//! pair), `recommendations` (every surfaced recommendation and whether it
//! was acted on), and `quality_metrics` (per-skill aggregates recomputed in
//! the same transaction as each rating write). The store never sees raw
//! user identity; callers pass an anonymous hash.

pub mod db;
pub mod errors;
pub mod export;
pub mod types;

pub use db::RatingsDb;
pub use errors::{RatingsError, Result};
pub use types::{
    ExportFormat, NewRecommendation, RatingSubmission, RecommendationRecord, SkillQualityMetrics,
    SkillRating,
};
