use colored::*;
use ctx_engine::{ContextEngine, EngineError};

pub fn execute(engine: &ContextEngine, json: bool) -> Result<(), EngineError> {
    let workflows = engine.workflow_list()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&workflows).expect("workflows serialize")
        );
        return Ok(());
    }

    if workflows.is_empty() {
        println!("{} no workflows found", "!".yellow());
        return Ok(());
    }
    for workflow in &workflows {
        println!(
            "  {} {:<28} {}",
            "→".cyan(),
            workflow.name.bold(),
            workflow.path.display().to_string().dimmed()
        );
    }
    Ok(())
}
