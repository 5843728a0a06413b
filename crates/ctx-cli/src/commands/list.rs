use colored::*;
use ctx_core::{ComponentKind, ComponentState};
use ctx_engine::{ContextEngine, EngineError};

pub fn execute(engine: &ContextEngine, kind: &str, json: bool) -> Result<(), EngineError> {
    let kind: ComponentKind = kind.parse().map_err(EngineError::Core)?;
    let infos = engine.component_list(kind)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&infos).expect("infos serialize"));
        return Ok(());
    }

    if infos.is_empty() {
        println!("{} no {kind}s found", "!".yellow());
        return Ok(());
    }

    println!();
    println!(
        "{} {} {kind}(s)",
        "→".cyan(),
        infos.len().to_string().yellow()
    );
    println!("  {}", "─".repeat(72).dimmed());
    for info in &infos {
        let marker = if info.broken.is_some() {
            "✗".red()
        } else if info.state == ComponentState::Active {
            "●".green()
        } else {
            "○".dimmed()
        };
        let mut line = format!("  {marker} {:<28}", info.name);
        if let Some(reason) = &info.broken {
            line.push_str(&format!("{} {reason}", "broken:".red()));
        } else if let Some(description) = &info.description {
            line.push_str(&description.dimmed().to_string());
        }
        println!("{line}");
    }
    println!();
    Ok(())
}
