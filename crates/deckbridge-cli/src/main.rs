use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "deckbridge")]
#[command(about = "Mirror the master deck's track to an OSC consumer")]
#[command(version)]
struct Cli {
    /// Path to the TOML config file
    #[arg(
        short,
        long,
        global = true,
        default_value = "deckbridge.toml",
        env = "DECKBRIDGE_CONFIG"
    )]
    config: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the bridge (default)
    Run(Overrides),
    /// List container elements whose text matches the given strings
    Scan {
        /// Texts to look for (e.g. the titles loaded on each deck)
        targets: Vec<String>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Send a master-deck notification to the bridge
    Notify {
        /// Zero-based deck index
        deck: i32,
        /// Bridge notification address (default: configured listen port on localhost)
        #[arg(long)]
        target: Option<SocketAddr>,
    },
    /// Print the effective configuration as TOML
    Config(Overrides),
}

/// Command-line overrides for config file values
#[derive(Args, Default, Clone)]
pub struct Overrides {
    /// Port to receive master-deck notifications on
    #[arg(long, env = "DECKBRIDGE_LISTEN_PORT")]
    pub listen_port: Option<u16>,
    /// Port of the downstream consumer on localhost
    #[arg(long, env = "DECKBRIDGE_OUTPUT_PORT")]
    pub output_port: Option<u16>,
    /// Interval between UI samples in milliseconds
    #[arg(long, env = "DECKBRIDGE_POLL_MS")]
    pub poll_ms: Option<u64>,
    /// Do not send a placeholder when the master deck changes
    #[arg(long)]
    pub no_placeholder: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "deckbridge=debug"
    } else {
        "deckbridge=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .init();

    match cli.command.unwrap_or_else(|| Command::Run(Overrides::default())) {
        Command::Run(overrides) => commands::run::run(&cli.config, &overrides),
        Command::Scan { targets, json } => commands::scan::run(&cli.config, &targets, json),
        Command::Notify { deck, target } => commands::notify::run(&cli.config, deck, target),
        Command::Config(overrides) => commands::show_config::run(&cli.config, &overrides),
    }
}
