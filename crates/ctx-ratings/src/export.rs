//! Ratings export.
//!
//! JSON export carries a `ratings` array and a `metrics` array. CSV export
//! is flat: one row per rating with that skill's metric columns appended,
//! which keeps the file loadable by a single spreadsheet import.

use serde::Serialize;

use crate::db::RatingsDb;
use crate::errors::Result;
use crate::types::{ExportFormat, SkillQualityMetrics, SkillRating};

#[derive(Serialize)]
struct ExportDocument<'a> {
    ratings: &'a [SkillRating],
    metrics: &'a [SkillQualityMetrics],
}

const CSV_HEADER: &str = "skill_name,user_hash,stars,timestamp,project_type,review,was_helpful,\
task_succeeded,avg_rating,total_ratings,helpful_percentage,success_correlation_percentage,\
token_efficiency_percentage,usage_count";

impl RatingsDb {
    /// Export ratings and metrics, optionally restricted to one skill.
    pub async fn export(
        &self,
        format: ExportFormat,
        skill_name: Option<&str>,
    ) -> Result<Vec<u8>> {
        let ratings = self.ratings(skill_name).await?;
        let metrics = self.metrics(skill_name).await?;
        match format {
            ExportFormat::Json => {
                let doc = ExportDocument {
                    ratings: &ratings,
                    metrics: &metrics,
                };
                Ok(serde_json::to_vec_pretty(&doc)
                    .expect("export document serializes"))
            }
            ExportFormat::Csv => Ok(to_csv(&ratings, &metrics).into_bytes()),
        }
    }
}

fn to_csv(ratings: &[SkillRating], metrics: &[SkillQualityMetrics]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for rating in ratings {
        let skill_metrics = metrics.iter().find(|m| m.skill_name == rating.skill_name);
        let fields: Vec<String> = vec![
            csv_escape(&rating.skill_name),
            csv_escape(&rating.user_hash),
            rating.stars.to_string(),
            rating.timestamp.to_rfc3339(),
            csv_escape(rating.project_type.as_deref().unwrap_or("")),
            csv_escape(rating.review.as_deref().unwrap_or("")),
            rating.was_helpful.to_string(),
            rating.task_succeeded.to_string(),
            skill_metrics.map_or(String::new(), |m| format!("{:.2}", m.avg_rating)),
            skill_metrics.map_or(String::new(), |m| m.total_ratings.to_string()),
            skill_metrics.map_or(String::new(), |m| format!("{:.1}", m.helpful_percentage)),
            skill_metrics.map_or(String::new(), |m| {
                format!("{:.1}", m.success_correlation_percentage)
            }),
            skill_metrics
                .and_then(|m| m.token_efficiency_percentage)
                .map_or(String::new(), |v| format!("{v:.1}")),
            skill_metrics.map_or(String::new(), |m| m.usage_count.to_string()),
        ];
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
