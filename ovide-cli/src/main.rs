//! # ovide CLI
//!
//! Command-line tooling for inspecting contextualization blocks of an ovide
//! production.

mod commands;
mod production;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ovide")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to block configuration file
    #[arg(long, default_value = "ovide.yml")]
    config: PathBuf,

    /// Path to the production file
    #[arg(long, default_value = "production.json")]
    production: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Mount a block for a contextualization, load its assets and print the result
    Render {
        /// Contextualization id
        contextualization: String,

        /// Rendering mode to evaluate ghost mode against
        #[arg(long, value_enum)]
        mode: Option<ModeArg>,

        /// Contextualization currently selected in the editor
        #[arg(long)]
        selected: Option<String>,

        /// Directory holding asset payloads (defaults to `assets/` next to the production file)
        #[arg(long)]
        assets_dir: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List the related assets referenced by a resource
    Related {
        /// Resource id
        resource: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum ModeArg {
    Screen,
    Paged,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so JSON output stays clean
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::INFO.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Render {
            contextualization,
            mode,
            selected,
            assets_dir,
            json,
        } => {
            let opts = commands::RenderOptions {
                mode,
                selected,
                assets_dir,
                json,
            };
            commands::render_block(&cli.config, &cli.production, &contextualization, opts).await
        }
        Commands::Related { resource, json } => {
            commands::list_related(&cli.production, &resource, json)
        }
    }
}
