use colored::*;
use ctx_engine::{ContextEngine, EngineError};

pub fn execute(engine: &ContextEngine, json: bool) -> Result<(), EngineError> {
    let broken = engine.doctor()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&broken).expect("infos serialize"));
        return Ok(());
    }

    if broken.is_empty() {
        println!("{} every component definition parses", "✓".green());
        return Ok(());
    }
    println!(
        "{} {} broken component(s)",
        "✗".red(),
        broken.len().to_string().bold()
    );
    for info in &broken {
        println!(
            "  {} {} {}: {}",
            "✗".red(),
            info.kind,
            info.name.bold(),
            info.broken.as_deref().unwrap_or("unknown reason")
        );
    }
    Ok(())
}
