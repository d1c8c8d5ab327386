//! Chanbase CLI - list, add, edit and delete channels from the terminal

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "chanbase")]
#[command(version)]
#[command(about = "Channel records in SQLite behind a URI-routed content provider")]
#[command(long_about = r#"
Chanbase stores channels (a name and a numeric channel id) in a local
SQLite database and addresses them by content URI:

  content://com.example.chanbase/channels      every channel
  content://com.example.chanbase/channels/<id> one channel

Example usage:
  chanbase add --name "My channel" --channel-id 9
  chanbase list
  chanbase edit 1 --channel-id 42
  chanbase delete content://com.example.chanbase/channels/1
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print machine-readable JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Path to the database file (overrides the config file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "chanbase.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// List channels
    List {
        /// SQL filter, e.g. "channel_id > 10"
        #[arg(short, long = "where")]
        filter: Option<String>,

        /// SQL sort order
        #[arg(short, long, default_value = "_id ASC")]
        sort: String,
    },

    /// Show one channel
    Show {
        /// Channel URI or row id
        target: String,
    },

    /// Add a channel
    Add {
        /// Channel name (surrounding whitespace is trimmed)
        #[arg(short, long)]
        name: String,

        /// Numeric channel id (defaults to 0)
        #[arg(short = 'i', long, allow_hyphen_values = true)]
        channel_id: Option<String>,
    },

    /// Edit a channel
    Edit {
        /// Channel URI or row id
        target: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New channel id
        #[arg(short = 'i', long, allow_hyphen_values = true)]
        channel_id: Option<String>,
    },

    /// Delete one channel
    Delete {
        /// Channel URI or row id
        target: String,
    },

    /// Delete every channel
    DeleteAll,

    /// Insert a sample channel
    InsertDummy,

    /// Print the type tag of a URI
    Type {
        /// Channel URI or row id
        target: String,
    },
}

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub fn is_human(self) -> bool {
        self == OutputMode::Human
    }
}

/// Print `{"ok": true, "command": .., "data": ..}` on stdout
pub fn emit_success(_output_mode: OutputMode, command: &str, data: serde_json::Value) -> anyhow::Result<()> {
    let envelope = serde_json::json!({
        "ok": true,
        "command": command,
        "data": data,
    });
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let output_mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    if let Err(e) = run(cli, output_mode) {
        if output_mode.is_human() {
            chanbase::ui::error(&format!("{:#}", e));
        } else {
            let envelope = serde_json::json!({ "ok": false, "error": format!("{:#}", e) });
            println!("{}", envelope);
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, output_mode: OutputMode) -> anyhow::Result<()> {
    let ctx = commands::Context::load(output_mode, cli.database, cli.config)?;

    match cli.command {
        Commands::Init { force } => commands::run_init(&ctx, force),
        Commands::List { filter, sort } => commands::run_list(&ctx, filter, &sort),
        Commands::Show { target } => commands::run_show(&ctx, &target),
        Commands::Add { name, channel_id } => commands::run_add(&ctx, &name, channel_id.as_deref()),
        Commands::Edit { target, name, channel_id } => {
            commands::run_edit(&ctx, &target, name.as_deref(), channel_id.as_deref())
        }
        Commands::Delete { target } => commands::run_delete(&ctx, &target),
        Commands::DeleteAll => commands::run_delete_all(&ctx),
        Commands::InsertDummy => commands::run_insert_dummy(&ctx),
        Commands::Type { target } => commands::run_type(&ctx, &target),
    }
}
