mod app;
mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ankipack-cli", about = "Build Anki decks and sync them over AnkiConnect", version)]
struct Cli {
    /// AnkiConnect URL (default: http://localhost:8765)
    #[arg(long, global = true)]
    url: Option<String>,

    /// TOML config file with template and AnkiConnect settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Build an .apkg file from a CSV of cards
    Build {
        /// CSV file with a header row and front,back[,tags] columns
        csv: PathBuf,
        /// Deck name
        #[arg(long)]
        name: String,
        /// Output .apkg path
        #[arg(long, short)]
        output: PathBuf,
        /// Media files to include (referenced by file name)
        #[arg(long)]
        media: Vec<PathBuf>,
    },

    /// Push a CSV of cards into a running Anki
    Push {
        /// CSV file with a header row and front,back[,tags] columns
        csv: PathBuf,
        /// Deck name
        #[arg(long)]
        name: String,
        /// Media files to include (referenced by file name)
        #[arg(long)]
        media: Vec<PathBuf>,
        /// Upload media files and attach them to notes
        #[arg(long)]
        sync_media: bool,
        /// Always add notes; never update remote notes with matching content
        #[arg(long)]
        no_update_existing: bool,
    },

    /// Pull a deck from a running Anki into an .apkg file
    Pull {
        /// Deck name
        #[arg(long)]
        name: String,
        /// Output .apkg path
        #[arg(long, short)]
        output: PathBuf,
    },

    /// Check that AnkiConnect is reachable
    Ping,

    /// List deck names in Anki
    Decks,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let app = app::App::new(cli.config.as_deref(), cli.url)?;

    match cli.command {
        Command::Build { csv, name, output, media } => {
            commands::build::run(&app, &csv, &name, &output, &media, &cli.format)?;
        }
        Command::Push { csv, name, media, sync_media, no_update_existing } => {
            commands::push::run(
                &app,
                &csv,
                &name,
                &media,
                sync_media,
                !no_update_existing,
                &cli.format,
            )?;
        }
        Command::Pull { name, output } => {
            commands::pull::run(&app, &name, &output, &cli.format)?;
        }
        Command::Ping => {
            commands::ping::run(&app, &cli.format)?;
        }
        Command::Decks => {
            commands::decks::run(&app, &cli.format)?;
        }
    }

    Ok(())
}
