use std::io::Write;

use colored::*;
use ctx_engine::{ContextEngine, EngineError};
use ctx_ratings::{ExportFormat, SkillQualityMetrics};

#[allow(clippy::too_many_arguments)]
pub async fn rate(
    engine: &ContextEngine,
    skill: &str,
    stars: u8,
    was_helpful: bool,
    task_succeeded: bool,
    review: Option<String>,
    project_type: Option<String>,
    json: bool,
) -> Result<(), EngineError> {
    let metrics = engine
        .rate_skill(skill, stars, was_helpful, task_succeeded, review, project_type)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&metrics).expect("metrics serialize")
        );
        return Ok(());
    }

    println!(
        "{} rated {} {}",
        "✓".green(),
        skill.bold(),
        stars_display(stars)
    );
    print_metrics(&metrics);
    Ok(())
}

pub async fn ratings(engine: &ContextEngine, skill: &str, json: bool) -> Result<(), EngineError> {
    let view = engine.skill_ratings(skill).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view).expect("view serializes"));
        return Ok(());
    }

    println!();
    println!("{} {}", "→".cyan(), skill.bold());
    print_metrics(&view.metrics);
    if !view.recent_reviews.is_empty() {
        println!();
        println!("  {}", "recent reviews".bold());
        for rating in &view.recent_reviews {
            let review = rating.review.as_deref().unwrap_or("(no text)");
            println!(
                "  {} {}  {}",
                stars_display(rating.stars),
                rating.timestamp.format("%Y-%m-%d").to_string().dimmed(),
                review
            );
        }
    }
    println!();
    Ok(())
}

pub async fn top(
    engine: &ContextEngine,
    limit: i64,
    min_ratings: i64,
    json: bool,
) -> Result<(), EngineError> {
    let entries = engine.skill_top_rated(limit, min_ratings).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&entries).expect("entries serialize")
        );
        return Ok(());
    }

    if entries.is_empty() {
        println!(
            "{} no skills with at least {min_ratings} rating(s)",
            "!".yellow()
        );
        return Ok(());
    }
    println!();
    for (rank, metrics) in entries.iter().enumerate() {
        println!(
            "  {:>2}. {:<28} {:.2} {} ({} ratings)",
            rank + 1,
            metrics.skill_name.bold(),
            metrics.avg_rating,
            "★".yellow(),
            metrics.total_ratings
        );
    }
    println!();
    Ok(())
}

pub async fn export(
    engine: &ContextEngine,
    format: &str,
    skill: Option<&str>,
) -> Result<(), EngineError> {
    let format: ExportFormat = format.parse().map_err(EngineError::Ratings)?;
    let bytes = engine.skill_export(format, skill).await?;
    std::io::stdout()
        .write_all(&bytes)
        .map_err(ctx_core::CoreError::Io)?;
    Ok(())
}

fn print_metrics(metrics: &SkillQualityMetrics) {
    println!(
        "  avg {:.2} over {} rating(s) · helpful {:.0}% · success {:.0}% · used {} time(s)",
        metrics.avg_rating,
        metrics.total_ratings,
        metrics.helpful_percentage,
        metrics.success_correlation_percentage,
        metrics.usage_count
    );
}

fn stars_display(stars: u8) -> String {
    let filled = "★".repeat(stars as usize);
    let empty = "☆".repeat(5usize.saturating_sub(stars as usize));
    format!("{}{}", filled.yellow(), empty.dimmed())
}
