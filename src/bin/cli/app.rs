use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use ankipack::anki_connect::AnkiConnect;
use ankipack::config::AppConfig;
use ankipack::deck::{CardOptions, Deck};

/// Shared state for CLI commands
pub struct App {
    pub config: AppConfig,
}

/// One row of a CSV deck file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvCard {
    pub front: String,
    pub back: String,
    pub tags: Vec<String>,
}

impl App {
    /// Load the optional config file and apply command-line overrides
    pub fn new(config_path: Option<&Path>, url: Option<String>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => AppConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => AppConfig::default(),
        };
        if let Some(url) = url {
            config.anki_connect.url = url;
        }
        Ok(Self { config })
    }

    pub fn client(&self) -> Result<AnkiConnect> {
        AnkiConnect::from_config(&self.config.anki_connect)
            .context("Failed to create AnkiConnect client")
    }

    /// Empty deck using the configured template
    pub fn new_deck(&self, name: &str) -> Result<Deck> {
        Deck::with_template(name, &self.config.template)
            .with_context(|| format!("Failed to create deck '{}'", name))
    }

    /// Build a deck from a CSV file and media files.
    pub fn build_deck(&self, name: &str, csv_path: &Path, media: &[PathBuf]) -> Result<Deck> {
        let mut deck = self.new_deck(name)?;

        for path in media {
            let filename = path
                .file_name()
                .and_then(|f| f.to_str())
                .with_context(|| format!("Invalid media path {}", path.display()))?;
            let data = fs::read(path)
                .with_context(|| format!("Failed to read media file {}", path.display()))?;
            deck.add_media(filename, data);
        }

        let file = fs::File::open(csv_path)
            .with_context(|| format!("Failed to open {}", csv_path.display()))?;
        for card in read_cards(file)? {
            let opts = CardOptions::with_tags(card.tags);
            deck.add_card_with_options(&card.front, &card.back, &opts)
                .with_context(|| format!("Failed to add card '{}'", card.front))?;
        }

        log::info!("Built deck '{}' from {}", name, csv_path.display());
        Ok(deck)
    }
}

/// Parse `front,back[,tags]` rows; the first row is a header.
pub fn read_cards<R: Read>(reader: R) -> Result<Vec<CsvCard>> {
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut cards = Vec::new();
    for (index, record) in csv.records().enumerate() {
        let record = record.context("Failed to read CSV row")?;
        // Header is line 1
        let line = index + 2;

        let (Some(front), Some(back)) = (record.get(0), record.get(1)) else {
            bail!("Line {}: expected at least front and back columns", line);
        };
        if front.is_empty() {
            bail!("Line {}: front is empty", line);
        }

        let tags = record
            .get(2)
            .map(|t| {
                t.split(';')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        cards.push(CsvCard {
            front: front.to_string(),
            back: back.to_string(),
            tags,
        });
    }
    Ok(cards)
}
