//! u-timetable - examination timetabling CLI
//!
//! ## Commands
//!
//! - `generate`: Write a synthetic session as JSON
//! - `run`: Build the timetable of a session file
//! - `audit`: Re-verify a timetable file against its session
//!
//! Engine limits come from `U_TIMETABLE_*` variables; log verbosity from
//! `U_TIMETABLE_LOG` (default `info`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use u_timetable::generator::{GeneratorConfig, SessionGenerator};
use u_timetable::{
    Conflict, EngineConfig, MemoryStore, SessionData, Timetable, TimetableEngine, TimetableStore,
};

#[derive(Parser)]
#[command(name = "u-timetable")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Examination timetabling engine", long_about = None)]
struct Cli {
    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a synthetic session as JSON
    Generate {
        /// Session id
        #[arg(long, default_value = "2026-S1")]
        session: String,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Generate a small session
        #[arg(long)]
        small: bool,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Build the timetable of a session file
    Run {
        /// Session file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Where to write the timetable and its conflicts (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Re-verify a timetable file against its session
    Audit {
        /// Session file (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Timetable file written by `run`
        #[arg(short, long)]
        timetable: PathBuf,
    },
}

/// File written by `run` and read by `audit`.
#[derive(Serialize, Deserialize)]
struct RunOutput {
    timetable: Timetable,
    conflicts: Vec<Conflict>,
}

fn init_tracing(json: bool) {
    let env_filter =
        EnvFilter::try_from_env("U_TIMETABLE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()
            .ok();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Commands::Generate {
            session,
            seed,
            small,
            output,
        } => {
            let config = if small {
                GeneratorConfig::small()
            } else {
                GeneratorConfig::default()
            };
            let data = SessionGenerator::new(config.with_seed(seed)).generate(&session);
            info!(
                session_id = %session,
                modules = data.modules.len(),
                groups = data.groups.len(),
                enrollments = data.enrollments.len(),
                "generated session"
            );
            write_json(&output, &data)
        }

        Commands::Run { input, output } => {
            let data: SessionData = read_json(&input)?;
            let session_id = data.session.id.clone();
            let store = Arc::new(MemoryStore::new());
            store.insert_session(data)?;

            let engine = TimetableEngine::new(store.clone(), store.clone(), engine_config()?);
            let report = engine.run(&session_id)?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            if let Some(path) = output {
                let timetable = store
                    .timetable(&session_id)?
                    .context("timetable missing after run")?;
                let conflicts = store.conflicts(&session_id)?;
                write_json(
                    &path,
                    &RunOutput {
                        timetable,
                        conflicts,
                    },
                )?;
            }
            Ok(())
        }

        Commands::Audit { input, timetable } => {
            let data: SessionData = read_json(&input)?;
            let previous: RunOutput = read_json(&timetable)?;
            let session_id = data.session.id.clone();
            anyhow::ensure!(
                previous.timetable.session_id == session_id,
                "timetable belongs to session {}, not {}",
                previous.timetable.session_id,
                session_id
            );

            let store = Arc::new(MemoryStore::new());
            store.insert_session(data)?;
            store.import_timetable(previous.timetable)?;

            let engine = TimetableEngine::new(store.clone(), store, engine_config()?);
            let summary = engine.audit(&session_id)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
            Ok(())
        }
    }
}

fn engine_config() -> Result<EngineConfig> {
    EngineConfig::from_env().context("invalid U_TIMETABLE_* configuration")
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw).with_context(|| format!("writing {}", path.display()))
}
