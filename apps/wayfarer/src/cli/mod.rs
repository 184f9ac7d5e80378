//! # CLI Module
//!
//! Command-line interface for the Wayfarer event log.
//!
//! Every command opens the database given by `--db` (default
//! `wayfarer.db`) and runs one operation against it. `--json` switches
//! the read commands from human summaries to machine-readable output.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wayfarer_core::WayfarerError;

// =============================================================================
// CLI DEFINITION
// =============================================================================

#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "Event-sourced learning journey log", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress the startup banner
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the event database
    #[arg(long, global = true, default_value = "wayfarer.db")]
    pub db: PathBuf,

    /// Emit machine-readable JSON instead of human summaries
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a new event database
    Init {
        /// Overwrite an existing database
        #[arg(long)]
        force: bool,
    },

    /// Import events from a JSONL file
    Import {
        /// Path to the JSONL file
        input: PathBuf,

        /// Rewrite every imported event onto this session id
        #[arg(long)]
        session_id: Option<String>,
    },

    /// Export a session's events to a JSONL file
    Export {
        /// Session to export
        session_id: String,

        /// Output path
        output: PathBuf,
    },

    /// Show a session's derived state
    State {
        /// Session to reduce
        session_id: String,
    },

    /// List a session's events
    Events {
        /// Session to list
        session_id: String,

        /// Only events on this branch head
        #[arg(long)]
        head: Option<String>,

        /// Lowest seq to include
        #[arg(long)]
        from_seq: Option<u64>,

        /// Highest seq to include
        #[arg(long)]
        to_seq: Option<u64>,
    },

    /// List all sessions
    Sessions,

    /// Run the HTTP API server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind
        #[arg(short, long, default_value_t = 8000)]
        port: u16,
    },

    /// Check log integrity and replay every session
    Doctor,
}

// =============================================================================
// COMMAND DISPATCH
// =============================================================================

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<(), WayfarerError> {
    match cli.command {
        Some(Commands::Init { force }) => commands::cmd_init(&cli.db, force),
        Some(Commands::Import { input, session_id }) => {
            commands::cmd_import(&cli.db, &input, session_id.as_deref())
        }
        Some(Commands::Export { session_id, output }) => {
            commands::cmd_export(&cli.db, &session_id, &output)
        }
        Some(Commands::State { session_id }) => {
            commands::cmd_state(&cli.db, &session_id, cli.json)
        }
        Some(Commands::Events {
            session_id,
            head,
            from_seq,
            to_seq,
        }) => commands::cmd_events(&cli.db, &session_id, head.as_deref(), from_seq, to_seq, cli.json),
        Some(Commands::Serve { host, port }) => commands::cmd_serve(&cli.db, &host, port).await,
        Some(Commands::Doctor) => commands::cmd_doctor(&cli.db),
        Some(Commands::Sessions) | None => commands::cmd_sessions(&cli.db, cli.json),
    }
}
