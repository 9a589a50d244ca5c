use std::path::Path;

use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, name: &str, output: &Path, format: &OutputFormat) -> Result<()> {
    let client = app.client()?;
    let mut deck = app.new_deck(name)?;

    let pulled = deck
        .pull_from_anki(&client)
        .with_context(|| format!("Failed to pull deck '{}' from {}", name, client.url()))?;
    deck.save_to_file(output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    deck.close()?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "deck": name,
                "cards": pulled,
                "output": output.to_string_lossy(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if pulled == 0 {
                println!("Deck \"{}\" has no notes in Anki", name);
            } else {
                println!("Pulled {} cards from \"{}\"", pulled, name);
            }
            println!("  Written to: {}", output.display());
        }
    }

    Ok(())
}
