use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &App,
    csv: &Path,
    name: &str,
    output: &Path,
    media: &[PathBuf],
    format: &OutputFormat,
) -> Result<()> {
    let deck = app.build_deck(name, csv, media)?;
    let cards = deck.notes()?.len();
    let media_count = deck.media().len();

    deck.save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    deck.close()?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deck": name,
                "cards": cards,
                "media": media_count,
                "output": output.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Built deck \"{}\" with {} cards", name, cards);
            if media_count > 0 {
                println!("  Media files: {}", media_count);
            }
            println!("  Written to: {}", output.display());
        }
    }

    Ok(())
}
