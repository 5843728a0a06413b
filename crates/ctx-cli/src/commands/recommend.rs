use std::path::Path;

use colored::*;
use ctx_engine::{ContextEngine, EngineError};
use ctx_intel::StreamStatus;

pub async fn recommend(
    engine: &ContextEngine,
    path: Option<&Path>,
    include_llm: bool,
    json: bool,
) -> Result<(), EngineError> {
    let cwd = std::env::current_dir().map_err(ctx_core::CoreError::Io)?;
    let target = path.unwrap_or(&cwd);
    let context = engine.detect_context(target)?;
    let prediction = engine.recommend(&context, include_llm).await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&prediction).expect("prediction serializes")
        );
        return Ok(());
    }

    if prediction.recommendations.is_empty() {
        println!("{} no recommendations for this context", "!".yellow());
    } else {
        println!();
        for rec in &prediction.recommendations {
            let auto = if rec.auto_activate {
                " auto".green().to_string()
            } else {
                String::new()
            };
            println!(
                "  {} {:<26} {:.0}%{auto}  {}",
                "→".cyan(),
                rec.name.bold(),
                rec.confidence * 100.0,
                format!("[{}] {}", rec.source, rec.reason).dimmed()
            );
        }
        println!();
    }

    for stream in &prediction.streams {
        match &stream.status {
            StreamStatus::TimedOut => {
                println!("{} {} stream timed out", "!".yellow(), stream.source)
            }
            StreamStatus::Failed(reason) => {
                println!("{} {} stream failed: {reason}", "!".yellow(), stream.source)
            }
            _ => {}
        }
    }
    Ok(())
}

pub async fn auto(
    engine: &ContextEngine,
    path: Option<&Path>,
    json: bool,
) -> Result<(), EngineError> {
    let cwd = std::env::current_dir().map_err(ctx_core::CoreError::Io)?;
    let target = path.unwrap_or(&cwd);
    let context = engine.detect_context(target)?;
    let prediction = engine.recommend(&context, false).await?;
    let report = engine
        .auto_activate(&context, &prediction.recommendations)
        .await?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).expect("report serializes")
        );
        return Ok(());
    }

    if report.considered() == 0 {
        println!("{} nothing to consider", "·".dimmed());
        return Ok(());
    }
    for outcome in &report.outcomes {
        if outcome.applied {
            println!(
                "{} {} ({:.0}%) {}",
                "✓".green(),
                outcome.name.bold(),
                outcome.confidence * 100.0,
                outcome.detail.dimmed()
            );
        } else {
            println!(
                "{} {} skipped: {}",
                "·".dimmed(),
                outcome.name,
                outcome.detail.dimmed()
            );
        }
    }
    Ok(())
}
