use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use ankipack::anki_connect::SyncOptions;

use crate::app::App;
use crate::OutputFormat;

pub fn run(
    app: &App,
    csv: &Path,
    name: &str,
    media: &[PathBuf],
    sync_media: bool,
    update_existing: bool,
    format: &OutputFormat,
) -> Result<()> {
    let deck = app.build_deck(name, csv, media)?;
    let client = app.client()?;

    let opts = sync_options(&app.config.sync, sync_media, update_existing);

    let report = deck
        .sync_to_anki(&client, &opts)
        .with_context(|| format!("Failed to push deck '{}' to {}", name, client.url()))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Plain => {
            println!("Pushed deck \"{}\" to {}", name, client.url());
            println!("  Added: {}", report.added);
            println!("  Updated: {}", report.updated);
            if report.duplicates > 0 {
                println!("  Skipped duplicates: {}", report.duplicates);
            }
            if opts.sync_media {
                println!(
                    "  Media uploaded: {} ({} failed)",
                    report.media_uploaded, report.media_failed
                );
            }
        }
    }

    Ok(())
}

/// `--no-update-existing` turns updates off; `--sync-media` turns media on.
fn sync_options(config: &SyncOptions, sync_media: bool, update_existing: bool) -> SyncOptions {
    SyncOptions {
        update_existing: update_existing && config.update_existing,
        sync_media: sync_media || config.sync_media,
        ..*config
    }
}
