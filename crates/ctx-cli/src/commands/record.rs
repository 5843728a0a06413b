use std::path::Path;
use std::time::Duration;

use colored::*;
use ctx_engine::{ContextEngine, EngineError};
use ctx_intel::SessionOutcome;

pub async fn execute(
    engine: &ContextEngine,
    outcome: SessionOutcome,
    agents: &[String],
    duration: u64,
    path: Option<&Path>,
) -> Result<(), EngineError> {
    let cwd = std::env::current_dir().map_err(ctx_core::CoreError::Io)?;
    let target = path.unwrap_or(&cwd);
    let context = engine.detect_context(target)?;

    let record = engine
        .record_session_outcome(&context, agents, Duration::from_secs(duration), outcome)
        .await?;
    println!(
        "{} recorded {} session ({} agent(s))",
        "✓".green(),
        record.outcome.to_string().bold(),
        record.agents_used.len()
    );
    Ok(())
}
