//! Main Entrypoint for the Classroom CLI
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Initializing logging.
//! 3. Replaying event scripts against an in-memory session store.
//! 4. Printing the agent catalog, rendered instructions and state schemas.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sahayak_classroom::{
    config::Config,
    script::{ReplayOutcome, Script, replay},
    store::InMemorySessionStore,
};
use sahayak_core::{
    Domain,
    activity::FunActivityState,
    agents::{AgentCatalog, AgentKind, instruction_vars, render_instruction},
    clock::SystemClock,
    planning::PlanningState,
    prompts::PromptLibrary,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Session state tools for the Sahayak teaching assistant.
#[derive(Parser)]
#[command(name = "classroom", version, about, long_about = None)]
struct Cli {
    /// Output machine-readable JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    /// Directory of `*.md` prompt templates; overrides `PROMPTS_PATH`.
    #[arg(long, global = true)]
    prompts: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an event script and print the resulting session.
    Replay {
        /// Path to the JSON event script.
        script: PathBuf,
    },
    /// Print the agent tree built from the prompts directory.
    Agents,
    /// Print an agent's instruction with session placeholders filled in.
    Instruction {
        /// Agent name, e.g. `lesson_planning_agent`.
        agent: String,
        /// Script whose final state fills the placeholders.
        #[arg(long)]
        script: Option<PathBuf>,
    },
    /// Print the JSON schema of a domain's session state.
    Schema {
        /// `fun_activity` or `planning`.
        domain: Domain,
        /// Write the schema to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn replay_script(config: &Config, path: &Path) -> Result<ReplayOutcome> {
    let script = Script::load(path)?;
    let mut store = InMemorySessionStore::new();
    let outcome = replay(
        &script,
        &mut store,
        &SystemClock,
        config.default_for(script.domain),
    )
    .with_context(|| format!("Replay of {} failed", path.display()))?;
    Ok(outcome)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;
    if let Some(prompts) = cli.prompts {
        config.prompts_path = prompts;
    }

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();
    info!(prompts_path = %config.prompts_path.display(), "Configuration loaded.");

    match cli.command {
        Commands::Replay { script } => {
            let outcome = replay_script(&config, &script)?;
            info!(session = %outcome.key, "Replay finished.");
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&outcome.state)?);
                println!();
                println!("{}", outcome.summary);
            }
        }
        Commands::Agents => {
            let prompts = PromptLibrary::load(&config.prompts_path)?;
            let root = AgentCatalog::standard(&prompts, &config.models)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&root)?);
            } else {
                for (depth, agent) in root.walk() {
                    let indent = "  ".repeat(depth);
                    match agent.kind {
                        AgentKind::Sequential => println!("{}{} (sequential)", indent, agent.name),
                        AgentKind::Llm => println!(
                            "{}{} [{}] -> {}",
                            indent, agent.name, agent.model, agent.output_key
                        ),
                    }
                }
            }
        }
        Commands::Instruction { agent, script } => {
            let prompts = PromptLibrary::load(&config.prompts_path)?;
            let root = AgentCatalog::standard(&prompts, &config.models)?;
            let spec = root
                .find(&agent)
                .with_context(|| format!("Unknown agent '{}'", agent))?;
            let state = match script {
                Some(path) => Some(replay_script(&config, &path)?.state),
                None => None,
            };
            let vars = instruction_vars(state.as_ref(), &SystemClock)?;
            println!("{}", render_instruction(&spec.instruction, &vars));
        }
        Commands::Schema { domain, out } => {
            let schema = match domain {
                Domain::FunActivity => schemars::schema_for!(FunActivityState),
                Domain::Planning => schemars::schema_for!(PlanningState),
            };
            let schema_json = serde_json::to_string_pretty(&schema)?;
            match out {
                Some(path) => {
                    std::fs::write(&path, schema_json)
                        .with_context(|| format!("Could not write {}", path.display()))?;
                    info!(path = %path.display(), %domain, "Schema written.");
                }
                None => println!("{}", schema_json),
            }
        }
    }

    Ok(())
}
