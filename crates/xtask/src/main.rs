//! Development tasks for the minimap workspace
//!
//! This binary provides development utilities using the cargo-xtask pattern.
//! Run with: `cargo xtask <command>`

mod commands;
mod config;
mod dirs;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use commands::{Decode, Render, Sample};
use config::XtaskConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Development tasks for the dungeon minimap
#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "Development tools for the dungeon minimap", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (floor, settings path, scan stride)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Decode a buffer dump and print the rooms
    Decode(Decode),

    /// Write a sample buffer dump
    Sample(Sample),

    /// Decode a buffer dump and draw it as text
    Render(Render),
}

fn main() -> Result<()> {
    // Load .env file if it exists (for MINIMAP_* variables)
    let _ = dotenvy::dotenv();

    setup_logging();

    let cli = Cli::parse();
    let config = XtaskConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Decode(cmd) => cmd.execute(&config),
        Command::Sample(cmd) => cmd.execute(),
        Command::Render(cmd) => cmd.execute(&config),
    }
}

/// Setup logging to stderr, filtered by `MINIMAP_LOG` or `RUST_LOG`
fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_env("MINIMAP_LOG")
        .or_else(|_| tracing_subscriber::EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
