mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sesslock", about = "Inspect and sweep exclusive-lock session stores")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// TOML configuration file
    #[arg(long, env = "SESSLOCK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Backend location: a directory, file://<dir>, memory: or redis://host:port
    #[arg(long, env = "SESSLOCK_SAVE_PATH", global = true)]
    save_path: Option<String>,

    /// Key namespace of the application whose sessions to operate on
    #[arg(long, env = "SESSLOCK_NAMESPACE", global = true)]
    namespace: Option<String>,

    /// Log every store operation with its arguments and result
    #[arg(long, global = true)]
    log_calls: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete session entries older than the TTL
    Gc {
        /// Maximum entry age in seconds (defaults to entry_ttl_seconds)
        #[arg(long)]
        ttl: Option<u64>,
        /// Keep sweeping every N seconds until interrupted
        #[arg(long)]
        watch: Option<u64>,
    },

    /// Print a new session id that collides with no existing entry
    CreateId,

    /// Report whether a session id is well-formed and already in use
    Check {
        /// Session id to check
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sl=info,sesslock=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = config::resolve(cli.config.as_deref(), cli.save_path, cli.namespace)?;

    match cli.command {
        Commands::Gc { ttl, watch } => commands::gc::run(&config, cli.log_calls, ttl, watch).await,
        Commands::CreateId => commands::create_id::run(&config, cli.log_calls).await,
        Commands::Check { id } => commands::check::run(&config, cli.log_calls, &id).await,
    }
}
