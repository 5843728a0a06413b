use std::path::Path;

use colored::*;
use ctx_engine::{ContextEngine, EngineError};

pub fn execute(
    engine: &ContextEngine,
    path: Option<&Path>,
    json: bool,
) -> Result<(), EngineError> {
    let cwd = std::env::current_dir().map_err(ctx_core::CoreError::Io)?;
    let target = path.unwrap_or(&cwd);
    let context = engine.detect_context(target)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&context).expect("context serializes")
        );
        return Ok(());
    }

    println!();
    println!("{} {}", "→".cyan(), target.display().to_string().bold());
    println!(
        "  files: {}  types: {}",
        context.files_changed.len().to_string().yellow(),
        context
            .file_types
            .iter()
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
            .dimmed()
    );

    let flags = context.architectural_flags();
    if flags.is_empty() {
        println!("  signals: {}", "none".dimmed());
    } else {
        println!("  signals: {}", flags.join(", ").green());
    }
    if !context.active_agents.is_empty() {
        println!(
            "  active agents: {}",
            context.active_agents.join(", ").cyan()
        );
    }
    println!();
    Ok(())
}
