use clap::{Parser, Subcommand};
use colored::*;
use ctx_core::CtxPaths;
use ctx_engine::{ContextEngine, EngineError};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "claude-ctx")]
#[command(about = "Manage the context stack for an AI coding assistant", long_about = None)]
#[command(version)]
struct Cli {
    /// Workspace root override (default: CLAUDE_CTX_HOME, then
    /// CLAUDE_PLUGIN_ROOT, then ~/.claude-ctx)
    #[arg(long, global = true)]
    root: Option<std::path::PathBuf>,

    /// Emit machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Increase log verbosity (-v: info, -vv: debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List components of a kind (agents, skills, modes, rules)
    List {
        /// Component kind
        kind: String,
    },

    /// Activate a component (agents pull in their whole requires closure)
    Activate {
        kind: String,
        name: String,
    },

    /// Deactivate a component
    Deactivate {
        kind: String,
        name: String,

        /// Proceed even when active agents still require this one
        #[arg(short, long)]
        force: bool,
    },

    /// Detect the session context of a working directory
    Detect {
        /// Directory to scan (default: current directory)
        path: Option<std::path::PathBuf>,
    },

    /// Recommend agents for a working directory
    Recommend {
        path: Option<std::path::PathBuf>,

        /// Consult the LLM collaborator when deterministic confidence is low
        #[arg(long)]
        llm: bool,
    },

    /// Detect, recommend, and activate eligible recommendations
    Auto {
        path: Option<std::path::PathBuf>,
    },

    /// Record a finished session into history
    Record {
        /// Outcome: success, failure, partial, abandoned
        #[arg(value_parser = parse_outcome)]
        outcome: ctx_intel::SessionOutcome,

        /// Agents used, comma-separated
        #[arg(long, value_delimiter = ',')]
        agents: Vec<String>,

        /// Session duration in seconds
        #[arg(long, default_value_t = 0)]
        duration: u64,

        /// Directory the session ran in (default: current directory)
        #[arg(long)]
        path: Option<std::path::PathBuf>,
    },

    /// Rate a skill from 1 to 5 stars
    Rate {
        skill: String,
        stars: u8,

        /// The skill was not helpful
        #[arg(long)]
        not_helpful: bool,

        /// The task ultimately failed
        #[arg(long)]
        task_failed: bool,

        /// Free-form review text
        #[arg(long)]
        review: Option<String>,

        /// Project type tag (web, cli, library, ...)
        #[arg(long)]
        project_type: Option<String>,
    },

    /// Show a skill's quality metrics and recent reviews
    Ratings {
        skill: String,
    },

    /// Show the top-rated skills
    Top {
        #[arg(long, default_value_t = 10)]
        limit: i64,

        /// Skills with fewer ratings are excluded
        #[arg(long, default_value_t = 3)]
        min_ratings: i64,
    },

    /// Export ratings and metrics
    Export {
        /// Output format: json or csv
        #[arg(long, default_value = "json")]
        format: String,

        /// Restrict to one skill
        #[arg(long)]
        skill: Option<String>,
    },

    /// Manage saved profiles
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },

    /// List inventoried workflows
    Workflows,

    /// Report components whose definitions fail to parse
    Doctor,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => {}
        Err(err) => {
            let report = err.report(None);
            eprintln!(
                "{} {}",
                format!("{}:", report.category.label()).red().bold(),
                report.message
            );
            if let Some(hint) = &report.hint {
                eprintln!("  {} {}", "hint:".yellow(), hint);
            }
            std::process::exit(report.category.exit_code());
        }
    }
}

fn parse_outcome(raw: &str) -> Result<ctx_intel::SessionOutcome, String> {
    raw.parse()
}

fn init_tracing(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), EngineError> {
    let paths = match &cli.root {
        Some(root) => CtxPaths::with_root(root.clone()),
        None => CtxPaths::resolve()?,
    };
    let engine = ContextEngine::builder(paths).build().await?;
    let json = cli.json;

    match cli.command {
        Commands::List { kind } => commands::list::execute(&engine, &kind, json),
        Commands::Activate { kind, name } => {
            commands::activate::activate(&engine, &kind, &name, json)
        }
        Commands::Deactivate { kind, name, force } => {
            commands::activate::deactivate(&engine, &kind, &name, force, json)
        }
        Commands::Detect { path } => commands::detect::execute(&engine, path.as_deref(), json),
        Commands::Recommend { path, llm } => {
            commands::recommend::recommend(&engine, path.as_deref(), llm, json).await
        }
        Commands::Auto { path } => {
            commands::recommend::auto(&engine, path.as_deref(), json).await
        }
        Commands::Record {
            outcome,
            agents,
            duration,
            path,
        } => commands::record::execute(&engine, outcome, &agents, duration, path.as_deref()).await,
        Commands::Rate {
            skill,
            stars,
            not_helpful,
            task_failed,
            review,
            project_type,
        } => {
            commands::rate::rate(
                &engine,
                &skill,
                stars,
                !not_helpful,
                !task_failed,
                review,
                project_type,
                json,
            )
            .await
        }
        Commands::Ratings { skill } => commands::rate::ratings(&engine, &skill, json).await,
        Commands::Top { limit, min_ratings } => {
            commands::rate::top(&engine, limit, min_ratings, json).await
        }
        Commands::Export { format, skill } => {
            commands::rate::export(&engine, &format, skill.as_deref()).await
        }
        Commands::Profile { action } => commands::profile::execute(&engine, action, json),
        Commands::Workflows => commands::workflows::execute(&engine, json),
        Commands::Doctor => commands::doctor::execute(&engine, json),
    }
}
