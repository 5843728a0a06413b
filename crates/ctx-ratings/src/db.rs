//! SQLite persistence for ratings, recommendations, and quality metrics.
//!
//! One database file holds all three tables so the metric recompute can
//! join ratings against recommendation usage inside a single transaction.
//! Every operation borrows a connection from the pool and releases it on
//! all exit paths; writes use explicit transactions and are serialized by
//! SQLite's single-writer semantics.

use std::path::Path;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::errors::{RatingsError, Result};
use crate::types::{
    NewRecommendation, RatingSubmission, RecommendationRecord, SkillQualityMetrics, SkillRating,
};

/// SQLite-backed ratings store.
pub struct RatingsDb {
    pool: SqlitePool,
}

impl RatingsDb {
    /// Open (or create) the database at `db_path`.
    ///
    /// `~` is expanded and parent directories are created. `:memory:` is
    /// accepted for tests and pins the pool to a single connection so the
    /// in-memory database is actually shared.
    pub async fn new(db_path: &str) -> Result<Self> {
        let db_path = shellexpand::tilde(db_path).to_string();

        let (url, max_connections) = if db_path == ":memory:" {
            ("sqlite::memory:".to_string(), 1)
        } else {
            if let Some(parent) = Path::new(&db_path).parent() {
                std::fs::create_dir_all(parent)?;
            }
            (format!("sqlite:{db_path}?mode=rwc"), 5)
        };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&url)
            .await?;

        let db = Self { pool };
        db.setup().await?;
        Ok(db)
    }

    /// The connection pool (for advanced usage).
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create tables and indexes.
    async fn setup(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ratings (
                skill_name TEXT NOT NULL,
                user_hash TEXT NOT NULL,
                stars INTEGER NOT NULL,
                timestamp TEXT NOT NULL,
                project_type TEXT,
                review TEXT,
                was_helpful INTEGER NOT NULL,
                task_succeeded INTEGER NOT NULL,
                PRIMARY KEY (skill_name, user_hash)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_ratings_skill
            ON ratings(skill_name)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS recommendations (
                id TEXT PRIMARY KEY,
                timestamp TEXT NOT NULL,
                context_hash TEXT NOT NULL,
                skill_name TEXT NOT NULL,
                confidence REAL NOT NULL,
                reason TEXT NOT NULL,
                source TEXT NOT NULL,
                auto_activate INTEGER NOT NULL,
                was_accepted INTEGER,
                was_applied INTEGER
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_recommendations_time_context
            ON recommendations(timestamp, context_hash)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS quality_metrics (
                skill_name TEXT PRIMARY KEY,
                avg_rating REAL NOT NULL,
                total_ratings INTEGER NOT NULL,
                helpful_percentage REAL NOT NULL,
                success_correlation_percentage REAL NOT NULL,
                token_efficiency_percentage REAL,
                usage_count INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- ratings ----------------------------------------------------------

    /// Upsert a rating and recompute the skill's quality metrics, all in
    /// one transaction. Re-submission by the same user replaces the
    /// previous row.
    pub async fn record_rating(
        &self,
        submission: RatingSubmission,
    ) -> Result<SkillQualityMetrics> {
        if !(1..=5).contains(&submission.stars) {
            return Err(RatingsError::InvalidStars(submission.stars));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO ratings (
                skill_name, user_hash, stars, timestamp,
                project_type, review, was_helpful, task_succeeded
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&submission.skill_name)
        .bind(&submission.user_hash)
        .bind(submission.stars as i64)
        .bind(now.to_rfc3339())
        .bind(&submission.project_type)
        .bind(&submission.review)
        .bind(submission.was_helpful as i64)
        .bind(submission.task_succeeded as i64)
        .execute(&mut *tx)
        .await?;

        // Full recompute from the ratings table; the aggregates are cheap
        // and this keeps the cache impossible to desynchronize.
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS total,
                AVG(stars) AS avg_stars,
                AVG(was_helpful) * 100.0 AS helpful_pct,
                AVG(task_succeeded) * 100.0 AS success_pct
            FROM ratings
            WHERE skill_name = ?
            "#,
        )
        .bind(&submission.skill_name)
        .fetch_one(&mut *tx)
        .await?;

        let total: i64 = row.get("total");
        let avg_rating: f64 = row.get::<Option<f64>, _>("avg_stars").unwrap_or(0.0);
        let helpful_percentage: f64 = row.get::<Option<f64>, _>("helpful_pct").unwrap_or(0.0);
        let success_correlation_percentage: f64 =
            row.get::<Option<f64>, _>("success_pct").unwrap_or(0.0);

        let usage_row = sqlx::query(
            "SELECT COUNT(*) AS usage_count FROM recommendations WHERE skill_name = ?",
        )
        .bind(&submission.skill_name)
        .fetch_one(&mut *tx)
        .await?;
        let usage_count: i64 = usage_row.get("usage_count");

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO quality_metrics (
                skill_name, avg_rating, total_ratings, helpful_percentage,
                success_correlation_percentage, token_efficiency_percentage,
                usage_count, last_updated
            )
            VALUES (?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&submission.skill_name)
        .bind(avg_rating)
        .bind(total)
        .bind(helpful_percentage)
        .bind(success_correlation_percentage)
        .bind(usage_count)
        .bind(now.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!(skill = %submission.skill_name, total, "rating recorded");

        Ok(SkillQualityMetrics {
            skill_name: submission.skill_name,
            avg_rating,
            total_ratings: total,
            helpful_percentage,
            success_correlation_percentage,
            token_efficiency_percentage: None,
            usage_count,
            last_updated: now,
        })
    }

    /// Cached quality metrics for one skill.
    pub async fn get_metrics(&self, skill_name: &str) -> Result<SkillQualityMetrics> {
        let row = sqlx::query("SELECT * FROM quality_metrics WHERE skill_name = ?")
            .bind(skill_name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| RatingsError::MetricsNotFound(skill_name.to_string()))?;
        metrics_from_row(&row)
    }

    /// The newest reviews for a skill, newest first.
    pub async fn recent_reviews(&self, skill_name: &str, limit: i64) -> Result<Vec<SkillRating>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM ratings
            WHERE skill_name = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(skill_name)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(rating_from_row).collect()
    }

    /// Leaderboard: skills with at least `min_ratings` ratings, ordered by
    /// average rating, then volume, then name.
    pub async fn top_rated(
        &self,
        limit: i64,
        min_ratings: i64,
    ) -> Result<Vec<SkillQualityMetrics>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM quality_metrics
            WHERE total_ratings >= ?
            ORDER BY avg_rating DESC, total_ratings DESC, skill_name ASC
            LIMIT ?
            "#,
        )
        .bind(min_ratings)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(metrics_from_row).collect()
    }

    /// All ratings, optionally restricted to one skill, for export.
    pub async fn ratings(&self, skill_name: Option<&str>) -> Result<Vec<SkillRating>> {
        let rows = match skill_name {
            Some(skill) => {
                sqlx::query(
                    "SELECT * FROM ratings WHERE skill_name = ? ORDER BY skill_name, user_hash",
                )
                .bind(skill)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM ratings ORDER BY skill_name, user_hash")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(rating_from_row).collect()
    }

    /// All metrics, optionally restricted to one skill, for export.
    pub async fn metrics(&self, skill_name: Option<&str>) -> Result<Vec<SkillQualityMetrics>> {
        let rows = match skill_name {
            Some(skill) => {
                sqlx::query("SELECT * FROM quality_metrics WHERE skill_name = ?")
                    .bind(skill)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM quality_metrics ORDER BY skill_name")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(metrics_from_row).collect()
    }

    // ---- recommendations --------------------------------------------------

    /// Persist a surfaced recommendation; returns its id.
    pub async fn record_recommendation(&self, rec: NewRecommendation) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO recommendations (
                id, timestamp, context_hash, skill_name, confidence,
                reason, source, auto_activate, was_accepted, was_applied
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL)
            "#,
        )
        .bind(&id)
        .bind(Utc::now().to_rfc3339())
        .bind(&rec.context_hash)
        .bind(&rec.skill_name)
        .bind(rec.confidence)
        .bind(&rec.reason)
        .bind(&rec.source)
        .bind(rec.auto_activate as i64)
        .execute(&self.pool)
        .await?;
        Ok(id)
    }

    /// Mark a recommendation as accepted by the user.
    pub async fn mark_accepted(&self, id: &str) -> Result<()> {
        self.mark(id, "was_accepted", true).await
    }

    /// Mark a recommendation as actually applied (activated).
    pub async fn mark_applied(&self, id: &str) -> Result<()> {
        self.mark(id, "was_applied", true).await
    }

    /// Record whether a recommendation was applied, explicitly. Used by the
    /// auto-activation cycle so every considered row ends up with a value.
    pub async fn set_applied(&self, id: &str, applied: bool) -> Result<()> {
        self.mark(id, "was_applied", applied).await
    }

    async fn mark(&self, id: &str, column: &str, value: bool) -> Result<()> {
        // Column names come from the callers above, never from input.
        let query = format!("UPDATE recommendations SET {column} = ? WHERE id = ?");
        let outcome = sqlx::query(&query)
            .bind(value as i64)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if outcome.rows_affected() == 0 {
            return Err(RatingsError::RecommendationNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Recommendations recorded for a context hash, newest first.
    pub async fn recommendations_for(
        &self,
        context_hash: &str,
    ) -> Result<Vec<RecommendationRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM recommendations
            WHERE context_hash = ?
            ORDER BY timestamp DESC
            "#,
        )
        .bind(context_hash)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(recommendation_from_row).collect()
    }
}

fn parse_timestamp(value: String) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| RatingsError::BadTimestamp {
            value,
            reason: err.to_string(),
        })
}

fn rating_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SkillRating> {
    Ok(SkillRating {
        skill_name: row.get("skill_name"),
        user_hash: row.get("user_hash"),
        stars: row.get::<i64, _>("stars") as u8,
        timestamp: parse_timestamp(row.get("timestamp"))?,
        project_type: row.get("project_type"),
        review: row.get("review"),
        was_helpful: row.get::<i64, _>("was_helpful") != 0,
        task_succeeded: row.get::<i64, _>("task_succeeded") != 0,
    })
}

fn metrics_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<SkillQualityMetrics> {
    Ok(SkillQualityMetrics {
        skill_name: row.get("skill_name"),
        avg_rating: row.get("avg_rating"),
        total_ratings: row.get("total_ratings"),
        helpful_percentage: row.get("helpful_percentage"),
        success_correlation_percentage: row.get("success_correlation_percentage"),
        token_efficiency_percentage: row.get("token_efficiency_percentage"),
        usage_count: row.get("usage_count"),
        last_updated: parse_timestamp(row.get("last_updated"))?,
    })
}

fn recommendation_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RecommendationRecord> {
    Ok(RecommendationRecord {
        id: row.get("id"),
        timestamp: parse_timestamp(row.get("timestamp"))?,
        context_hash: row.get("context_hash"),
        skill_name: row.get("skill_name"),
        confidence: row.get("confidence"),
        reason: row.get("reason"),
        source: row.get("source"),
        auto_activate: row.get::<i64, _>("auto_activate") != 0,
        was_accepted: row
            .get::<Option<i64>, _>("was_accepted")
            .map(|v| v != 0),
        was_applied: row.get::<Option<i64>, _>("was_applied").map(|v| v != 0),
    })
}
