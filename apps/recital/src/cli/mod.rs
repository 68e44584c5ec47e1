//! # Recital CLI Module
//!
//! This module implements the CLI interface for Recital.
//!
//! ## Available Commands
//!
//! - `server` - Start the HTTP server
//! - `init` - Initialize a new database
//! - `list` - List titles, newest first
//! - `show` - Show one poem
//! - `add` - Add a poem
//! - `remove` - Delete a poem
//! - `study` - Mark a poem as being studied
//! - `draw` - Draw a weighted-random practice set
//! - `settings` - Read or change settings
//! - `compact` - Compact the redb database file

mod commands;

use clap::{Parser, Subcommand};
use recital::backend::Backend;
use recital::config::{AppConfig, ConfigLayer};
use recital_core::RecitalError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Recital - Poem Practice Server
///
/// Keeps a library of poems and serves practice sets biased toward
/// the poems you have recited least.
#[derive(Parser, Debug)]
#[command(name = "recital")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the poem database [default: recital.db]
    #[arg(short = 'D', long, global = true)]
    pub database: Option<PathBuf>,

    /// Storage backend [default: redb]
    #[arg(short = 'B', long, global = true, value_enum)]
    pub backend: Option<Backend>,

    /// TOML configuration file
    #[arg(short = 'c', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start HTTP server
    Server {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to [default: 5000]
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory of static front-end files
        #[arg(long)]
        public_dir: Option<PathBuf>,

        /// Requests per second, 0 disables [default: 100]
        #[arg(long)]
        rate_limit: Option<u32>,

        /// Do not insert the sample poems into an empty library
        #[arg(long)]
        no_seed: bool,
    },

    /// Initialize a new database
    Init {
        /// Force initialization even if database exists
        #[arg(short, long)]
        force: bool,

        /// Skip the sample poems
        #[arg(long)]
        empty: bool,
    },

    /// List titles, newest first
    List,

    /// Show one poem
    Show {
        /// Poem title
        title: String,
    },

    /// Add a poem
    Add {
        /// Poem title
        title: String,

        /// Poem text
        #[arg(conflicts_with = "file", required_unless_present = "file")]
        content: Option<String>,

        /// Read the poem text from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Delete a poem
    Remove {
        /// Poem title
        title: String,
    },

    /// Mark a poem as being studied
    Study {
        /// Poem title
        title: String,
    },

    /// Draw a weighted-random practice set
    Draw {
        /// Number of poems [default: the random_count setting]
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        count: Option<i64>,

        /// Seed for a reproducible draw
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Read or change settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Compact the redb database file
    Compact,
}

/// `settings` subcommands.
#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    /// Show all settings, or one key
    Get {
        /// Setting key
        key: Option<String>,
    },

    /// Set a key to a value
    Set {
        /// Setting key
        key: String,

        /// Setting value
        value: String,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub async fn execute(cli: Cli) -> Result<(), RecitalError> {
    let json_mode = cli.json_mode;

    let mut flags = ConfigLayer {
        database: cli.database,
        backend: cli.backend,
        ..ConfigLayer::default()
    };
    let no_seed = match &cli.command {
        Some(Commands::Server {
            host,
            port,
            public_dir,
            rate_limit,
            no_seed,
        }) => {
            flags.host = host.clone();
            flags.port = *port;
            flags.public_dir = public_dir.clone();
            flags.rate_limit = *rate_limit;
            *no_seed
        }
        _ => false,
    };
    let config = AppConfig::load(cli.config.as_deref(), flags)?;

    match cli.command {
        Some(Commands::Server { .. }) => cmd_server(&config, !no_seed).await,
        Some(Commands::Init { force, empty }) => cmd_init(&config, force, !empty),
        Some(Commands::List) => cmd_list(&config, json_mode),
        Some(Commands::Show { title }) => cmd_show(&config, json_mode, &title),
        Some(Commands::Add {
            title,
            content,
            file,
        }) => cmd_add(&config, json_mode, &title, content, file.as_deref()),
        Some(Commands::Remove { title }) => cmd_remove(&config, json_mode, &title),
        Some(Commands::Study { title }) => cmd_study(&config, json_mode, &title),
        Some(Commands::Draw { count, seed }) => cmd_draw(&config, json_mode, count, seed),
        Some(Commands::Settings { action }) => match action {
            Some(SettingsAction::Set { key, value }) => {
                cmd_settings_set(&config, json_mode, &key, &value)
            }
            Some(SettingsAction::Get { key }) => cmd_settings_get(&config, json_mode, key.as_deref()),
            None => cmd_settings_get(&config, json_mode, None),
        },
        Some(Commands::Compact) => cmd_compact(&config, json_mode),
        None => {
            // No subcommand - list titles by default
            cmd_list(&config, json_mode)
        }
    }
}
