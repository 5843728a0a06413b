use colored::*;
use ctx_core::ComponentKind;
use ctx_engine::{ContextEngine, EngineError};

pub fn activate(
    engine: &ContextEngine,
    kind: &str,
    name: &str,
    json: bool,
) -> Result<(), EngineError> {
    let kind: ComponentKind = kind.parse().map_err(EngineError::Core)?;
    let report = engine.activate(kind, name)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
        return Ok(());
    }

    for activated in &report.activated {
        println!("{} activated {}", "✓".green(), activated.bold());
    }
    for already in &report.already_active {
        println!("{} {} already active", "·".dimmed(), already);
    }
    for err in &report.errors {
        println!("{} {} failed: {}", "✗".red(), err.name.bold(), err.message);
    }
    if report.activated.is_empty() && report.errors.is_empty() {
        println!("{} nothing to do", "·".dimmed());
    }
    Ok(())
}

pub fn deactivate(
    engine: &ContextEngine,
    kind: &str,
    name: &str,
    force: bool,
    json: bool,
) -> Result<(), EngineError> {
    let kind: ComponentKind = kind.parse().map_err(EngineError::Core)?;
    let report = engine.deactivate(kind, name, force)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).expect("report serializes"));
        return Ok(());
    }

    for deactivated in &report.deactivated {
        println!("{} deactivated {}", "✓".green(), deactivated.bold());
    }
    for warning in &report.warnings {
        println!("{} {warning}", "!".yellow());
    }
    Ok(())
}
