use clap::Subcommand;
use colored::*;
use ctx_engine::{ContextEngine, EngineError};

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Save the current active set under a name
    Save { name: String },

    /// Apply a saved profile
    Apply { name: String },

    /// List saved profiles
    List,

    /// Show a saved profile
    Show { name: String },
}

pub fn execute(
    engine: &ContextEngine,
    action: ProfileAction,
    json: bool,
) -> Result<(), EngineError> {
    match action {
        ProfileAction::Save { name } => {
            let profile = engine.profile_snapshot()?;
            engine.profile_save(&name, &profile)?;
            println!(
                "{} saved profile {} ({} agents, {} modes, {} rules)",
                "✓".green(),
                name.bold(),
                profile.agents.len(),
                profile.modes.len(),
                profile.rules.len()
            );
            Ok(())
        }
        ProfileAction::Apply { name } => {
            let profile = engine.profile_load(&name)?;
            let diff = engine.profile_apply(&profile)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&diff).expect("diff serializes"));
                return Ok(());
            }
            if diff.is_noop() {
                println!("{} profile {} already in effect", "·".dimmed(), name.bold());
                return Ok(());
            }
            for step in &diff.applied {
                println!(
                    "{} {:?} {} {}",
                    "✓".green(),
                    step.action,
                    step.kind,
                    step.name
                );
            }
            for (step, reason) in &diff.failed {
                println!("{} {} {} failed: {reason}", "✗".red(), step.kind, step.name);
            }
            if !diff.skipped.is_empty() {
                println!("{} {} step(s) skipped after failure", "!".yellow(), diff.skipped.len());
            }
            Ok(())
        }
        ProfileAction::List => {
            let names = engine.profile_list()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&names).expect("names serialize"));
                return Ok(());
            }
            if names.is_empty() {
                println!("{} no saved profiles", "!".yellow());
            } else {
                for name in names {
                    println!("  {name}");
                }
            }
            Ok(())
        }
        ProfileAction::Show { name } => {
            let profile = engine.profile_load(&name)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&profile).expect("profile serializes")
                );
                return Ok(());
            }
            println!("{} {}", "→".cyan(), name.bold());
            for (label, set) in [
                ("agents", &profile.agents),
                ("modes", &profile.modes),
                ("rules", &profile.rules),
            ] {
                let items: Vec<&str> = set.iter().map(String::as_str).collect();
                println!("  {label}: {}", items.join(", "));
            }
            Ok(())
        }
    }
}
