//! template-tree CLI tool

#![forbid(unsafe_code)]
#![deny(clippy::all, clippy::pedantic, clippy::nursery)]
#![warn(clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use template_tree::observability::ObservabilityConfig;
use template_tree_cli_lib::commands::{RenderCommand, TreeCommand};

#[derive(Parser)]
#[command(name = "template-tree")]
#[command(version)]
#[command(about = "Render and inspect template-tree configurations", long_about = None)]
struct Cli {
    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, compile and attach every template, then print the markup
    Render {
        /// Configuration file (`.toml` or `.json`)
        config: PathBuf,
        /// Write the markup to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// How long to wait for the tree to attach
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
    /// Print the containment tree
    Tree {
        /// Configuration file (`.toml` or `.json`)
        config: PathBuf,
        /// Emit JSON instead of an indented tree
        #[arg(long)]
        json: bool,
        /// How long to wait for the tree to attach
        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ObservabilityConfig::new("template-tree-cli")
        .with_pretty()
        .with_default_filter(cli.log)
        .init()?;

    match cli.command {
        Commands::Render {
            config,
            output,
            timeout_ms,
        } => {
            RenderCommand::new(config, output, timeout_ms).execute().await?;
        }
        Commands::Tree {
            config,
            json,
            timeout_ms,
        } => {
            TreeCommand::new(config, json, timeout_ms).execute().await?;
        }
    }

    Ok(())
}
