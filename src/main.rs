//! chard - drive character actors from the command line

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chard::character::GameState;
use chard::db::Database;
use chard::{CharacterStore, Config, DispatchOutcome, MemoryStore, Roster, SqliteStore};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Tabletop RPG character agent engine
#[derive(Parser, Debug)]
#[command(name = "chard", version, about = "Run character actions and events")]
struct Cli {
    /// Configuration file (defaults to chard.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a JSON-lines script of actions and events
    Replay {
        #[command(flatten)]
        character: CharacterArgs,

        /// Script file, one `{"action"|"event": tag, "data": {...}}` per line
        script: PathBuf,
    },
    /// Print a character sheet
    Sheet {
        #[command(flatten)]
        character: CharacterArgs,
    },
}

#[derive(Args, Debug)]
struct CharacterArgs {
    /// Character id
    #[arg(long = "character")]
    id: String,

    /// Name for a new character
    #[arg(long)]
    name: Option<String>,

    /// Class for a new character
    #[arg(long, default_value = "fighter")]
    class: String,

    /// Level for a new character
    #[arg(long, default_value_t = 1)]
    level: u32,
}

/// One script step
#[derive(Debug, Deserialize)]
struct ScriptLine {
    #[serde(default)]
    action: Option<String>,
    #[serde(default)]
    event: Option<String>,
    /// Join this session before continuing
    #[serde(default)]
    session: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Logs go to stderr; stdout carries results
    let (plain, json) = if config.log_json {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr);
        (None, Some(layer))
    } else {
        let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        (Some(layer), None)
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chard=info".into()),
        )
        .with(plain)
        .with(json)
        .init();

    let store: Arc<dyn CharacterStore> = match config.database.as_deref() {
        Some(path) => {
            let db = Database::new(Some(path)).await?;
            info!("Using character database {}", path);
            Arc::new(SqliteStore::new(db.pool().clone()))
        }
        None => {
            info!("No database configured, characters are kept in memory");
            MemoryStore::shared()
        }
    };

    let roster = Roster::new(store)
        .with_queue_depth(config.queue_depth)
        .with_seed(config.seed);

    match cli.command {
        Command::Replay { character, script } => replay(&roster, &character, &script).await,
        Command::Sheet { character } => {
            let handle = spawn(&roster, &character).await?;
            let sheet = handle.sheet().await?;
            println!("{}", serde_json::to_string_pretty(&sheet)?);
            Ok(())
        }
    }
}

async fn spawn(roster: &Roster, args: &CharacterArgs) -> Result<chard::CharacterHandle> {
    let name = args.name.as_deref().unwrap_or(&args.id);
    let handle = roster
        .get_or_spawn(&args.id, name, &args.class, args.level)
        .await?;
    Ok(handle)
}

async fn replay(roster: &Roster, args: &CharacterArgs, script: &Path) -> Result<()> {
    let source = std::fs::read_to_string(script)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", script.display(), e))?;
    let handle = spawn(roster, args).await?;

    for (index, line) in source.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let step: ScriptLine = serde_json::from_str(line)
            .with_context(|| format!("Invalid script line {}", index + 1))?;

        let output = match (step.session, step.action, step.event) {
            (Some(session_id), None, None) => {
                let game_state: GameState = step.data.as_object().cloned().unwrap_or_default();
                serde_json::to_value(handle.join_session(&session_id, game_state, None).await?)?
            }
            (None, Some(action), None) => {
                serde_json::to_value(handle.process(&action, step.data).await?)?
            }
            (None, None, Some(event)) => match handle.dispatch_outcome(&event, step.data).await? {
                DispatchOutcome::Handled(ack) | DispatchOutcome::Unknown(ack) => {
                    serde_json::to_value(ack)?
                }
                DispatchOutcome::Errored(error) => {
                    serde_json::json!({"event": event, "error": error})
                }
            },
            _ => bail!(
                "Script line {} needs exactly one of action, event or session",
                index + 1
            ),
        };

        println!("{}", serde_json::to_string(&output)?);
    }

    let status = handle.status().await?;
    info!(
        "Replay finished at snapshot v{} ({} persist failures)",
        status.version, status.persist_failures
    );
    Ok(())
}
