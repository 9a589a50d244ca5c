use anyhow::{Context, Result};

use crate::app::App;
use crate::OutputFormat;

pub fn run(app: &App, format: &OutputFormat) -> Result<()> {
    let client = app.client()?;
    let mut names = client
        .deck_names()
        .with_context(|| format!("Failed to list decks at {}", client.url()))?;
    names.sort();

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&names)?);
        }
        OutputFormat::Plain => {
            if names.is_empty() {
                println!("No decks.");
            }
            for name in &names {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
