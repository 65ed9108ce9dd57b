//! Switchboard CLI — the main entry point.
//!
//! Commands:
//! - `route`    — Route a request to the best-suited service
//! - `store`    — Store a memory
//! - `recall`   — Recall memories relevant to a query
//! - `status`   — Memory store and dependency status
//! - `services` — List registered services, optionally explaining a routing decision
//! - `init`     — Write the default configuration file

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use switchboard_core::memory::MemoryCategory;

mod commands;
mod runtime;

#[derive(Parser)]
#[command(
    name = "switchboard",
    about = "Switchboard — capability-aware request routing with semantic memory",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Use this config file instead of ~/.switchboard/config.toml
    #[arg(long, global = true, env = "SWITCHBOARD_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a request and print the routing result
    Route {
        /// The request text
        text: String,

        /// Routing context (defaults to the configured default context)
        #[arg(short, long)]
        context: Option<String>,

        /// Per-invocation deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Store a memory
    Store {
        /// The text to remember
        content: String,

        /// One of: architecture, bug_solution, code_decision, workflow
        #[arg(short = 'C', long)]
        category: MemoryCategory,

        /// Tag to attach (repeatable)
        #[arg(short, long = "tag")]
        tags: Vec<String>,
    },

    /// Recall memories relevant to a query
    Recall {
        /// What to look for
        query: String,

        /// Restrict to one category
        #[arg(short = 'C', long)]
        category: Option<MemoryCategory>,

        /// Maximum number of results
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show memory store status
    Status,

    /// List registered services and their health
    Services {
        /// Show how each service scores for this request text
        #[arg(long)]
        explain: Option<String>,

        /// Routing context used with --explain
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = cli.config.as_deref();

    match cli.command {
        Commands::Route {
            text,
            context,
            timeout_ms,
        } => commands::route::run(config, &text, context.as_deref(), timeout_ms).await?,
        Commands::Store {
            content,
            category,
            tags,
        } => commands::memory::store(config, &content, category, tags).await?,
        Commands::Recall {
            query,
            category,
            limit,
        } => commands::memory::recall(config, &query, category, limit).await?,
        Commands::Status => commands::status::run(config).await?,
        Commands::Services { explain, context } => {
            commands::services::run(config, explain.as_deref(), context.as_deref()).await?
        }
        Commands::Init { force } => commands::init::run(config, force)?,
    }

    Ok(())
}
