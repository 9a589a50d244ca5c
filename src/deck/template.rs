//! Collection bootstrap: schema DDL plus typed seed configuration.
//!
//! The `col` row holds four JSON blobs (`conf`, `models`, `decks`, `dconf`).
//! They are modelled here as plain structs and only turned into JSON when
//! the bootstrap script is rendered or when [`super::Deck`] rewrites them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::errors::Result;
use super::models::TemplateOptions;

/// Key of the built-in "Default" deck and options group.
pub const DEFAULT_DECK_KEY: &str = "1";

/// Placeholder id of the seeded deck that becomes the deck being built.
pub const SEED_DECK_ID: i64 = 1435588830424;

/// Placeholder id of the seeded note type.
pub const SEED_MODEL_ID: i64 = 1388596687391;

/// Collection schema version written to `col.ver`.
pub const SCHEMA_VERSION: i64 = 11;

pub const DEFAULT_QUESTION_FORMAT: &str = "{{Front}}";

pub const DEFAULT_ANSWER_FORMAT: &str = "{{FrontSide}}\n\n<hr id=\"answer\">\n\n{{Back}}";

pub const DEFAULT_CSS: &str = ".card {
 font-family: arial;
 font-size: 20px;
 text-align: center;
 color: black;
background-color: white;
}";

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";

const LATEX_POST: &str = "\\end{document}";

const TABLES: &str = r#"
    CREATE TABLE col (
        id              integer primary key,
        crt             integer not null,
        mod             integer not null,
        scm             integer not null,
        ver             integer not null,
        dty             integer not null,
        usn             integer not null,
        ls              integer not null,
        conf            text not null,
        models          text not null,
        decks           text not null,
        dconf           text not null,
        tags            text not null
    );
    CREATE TABLE notes (
        id              integer primary key,   /* 0 */
        guid            text not null,         /* 1 */
        mid             integer not null,      /* 2 */
        mod             integer not null,      /* 3 */
        usn             integer not null,      /* 4 */
        tags            text not null,         /* 5 */
        flds            text not null,         /* 6 */
        sfld            integer not null,      /* 7 */
        csum            integer not null,      /* 8 */
        flags           integer not null,      /* 9 */
        data            text not null          /* 10 */
    );
    CREATE TABLE cards (
        id              integer primary key,   /* 0 */
        nid             integer not null,      /* 1 */
        did             integer not null,      /* 2 */
        ord             integer not null,      /* 3 */
        mod             integer not null,      /* 4 */
        usn             integer not null,      /* 5 */
        type            integer not null,      /* 6 */
        queue           integer not null,      /* 7 */
        due             integer not null,      /* 8 */
        ivl             integer not null,      /* 9 */
        factor          integer not null,      /* 10 */
        reps            integer not null,      /* 11 */
        lapses          integer not null,      /* 12 */
        left            integer not null,      /* 13 */
        odue            integer not null,      /* 14 */
        odid            integer not null,      /* 15 */
        flags           integer not null,      /* 16 */
        data            text not null          /* 17 */
    );
    CREATE TABLE revlog (
        id              integer primary key,
        cid             integer not null,
        usn             integer not null,
        ease            integer not null,
        ivl             integer not null,
        lastIvl         integer not null,
        factor          integer not null,
        time            integer not null,
        type            integer not null
    );
    CREATE TABLE graves (
        usn             integer not null,
        oid             integer not null,
        type            integer not null
    );
"#;

const INDEXES: &str = r#"
    ANALYZE sqlite_master;
    INSERT INTO "sqlite_stat1" VALUES('col',NULL,'1');
    CREATE INDEX ix_notes_usn on notes (usn);
    CREATE INDEX ix_cards_usn on cards (usn);
    CREATE INDEX ix_revlog_usn on revlog (usn);
    CREATE INDEX ix_cards_nid on cards (nid);
    CREATE INDEX ix_cards_sched on cards (did, queue, due);
    CREATE INDEX ix_revlog_cid on revlog (cid);
    CREATE INDEX ix_notes_csum on notes (csum);
"#;

/// Collection-wide runtime configuration (`col.conf`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConf {
    pub next_pos: i64,
    pub est_times: bool,
    pub active_decks: Vec<i64>,
    pub sort_type: String,
    pub time_lim: i64,
    pub sort_backwards: bool,
    pub add_to_cur: bool,
    pub cur_deck: i64,
    pub new_bury: bool,
    pub new_spread: i64,
    pub due_counts: bool,
    pub cur_model: String,
    pub collapse_time: i64,
}

impl Default for CollectionConf {
    fn default() -> Self {
        Self {
            next_pos: 1,
            est_times: true,
            active_decks: vec![1],
            sort_type: "noteFld".to_string(),
            time_lim: 0,
            sort_backwards: false,
            add_to_cur: true,
            cur_deck: 1,
            new_bury: true,
            new_spread: 0,
            due_counts: true,
            cur_model: "1435645724216".to_string(),
            collapse_time: 1200,
        }
    }
}

/// A field of a note type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    pub media: Vec<String>,
    pub sticky: bool,
    pub rtl: bool,
    pub ord: i64,
    pub font: String,
    pub size: i64,
}

impl FieldDefinition {
    fn new(name: &str, ord: i64) -> Self {
        Self {
            name: name.to_string(),
            media: Vec::new(),
            sticky: false,
            rtl: false,
            ord,
            font: "Arial".to_string(),
            size: 20,
        }
    }
}

/// A card template of a note type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardTemplate {
    pub name: String,
    pub qfmt: String,
    pub did: Option<i64>,
    pub bafmt: String,
    pub afmt: String,
    pub ord: i64,
    pub bqfmt: String,
}

/// A note type ("model") entry of `col.models`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    pub vers: Vec<serde_json::Value>,
    pub name: String,
    pub tags: Vec<String>,
    pub did: i64,
    pub usn: i64,
    pub req: Vec<(i64, String, Vec<i64>)>,
    pub flds: Vec<FieldDefinition>,
    pub sortf: i64,
    pub latex_pre: String,
    pub tmpls: Vec<CardTemplate>,
    pub latex_post: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub id: i64,
    pub css: String,
    #[serde(rename = "mod")]
    pub modified: i64,
}

impl ModelDefinition {
    /// The seeded front/back note type, using `opts` for the template.
    pub fn basic(opts: &TemplateOptions) -> Self {
        Self {
            vers: Vec::new(),
            name: "Basic-f15d2".to_string(),
            tags: vec!["Tag".to_string()],
            did: SEED_DECK_ID,
            usn: -1,
            req: vec![(0, "all".to_string(), vec![0])],
            flds: vec![FieldDefinition::new("Front", 0), FieldDefinition::new("Back", 1)],
            sortf: 0,
            latex_pre: LATEX_PRE.to_string(),
            tmpls: vec![CardTemplate {
                name: "Card 1".to_string(),
                qfmt: or_default(&opts.question_format, DEFAULT_QUESTION_FORMAT),
                did: None,
                bafmt: String::new(),
                afmt: or_default(&opts.answer_format, DEFAULT_ANSWER_FORMAT),
                ord: 0,
                bqfmt: String::new(),
            }],
            latex_post: LATEX_POST.to_string(),
            kind: 0,
            id: SEED_MODEL_ID,
            css: or_default(&opts.css, DEFAULT_CSS),
            modified: 1435645658,
        }
    }
}

/// A deck entry of `col.decks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckDefinition {
    pub desc: String,
    pub name: String,
    pub extend_rev: i64,
    pub usn: i64,
    pub collapsed: bool,
    pub new_today: [i64; 2],
    pub time_today: [i64; 2],
    #[serde(rename = "dyn")]
    pub dynamic: i64,
    pub extend_new: i64,
    pub conf: i64,
    pub rev_today: [i64; 2],
    pub lrn_today: [i64; 2],
    pub id: i64,
    #[serde(rename = "mod")]
    pub modified: i64,
}

impl DeckDefinition {
    fn new(id: i64, name: &str, usn: i64, today: i64, modified: i64) -> Self {
        Self {
            desc: String::new(),
            name: name.to_string(),
            extend_rev: 50,
            usn,
            collapsed: false,
            new_today: [today, 0],
            time_today: [today, 0],
            dynamic: 0,
            extend_new: 10,
            conf: 1,
            rev_today: [today, 0],
            lrn_today: [today, 0],
            id,
            modified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LapseOptions {
    pub leech_fails: i64,
    pub min_int: i64,
    pub delays: Vec<i64>,
    pub leech_action: i64,
    pub mult: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOptions {
    pub per_day: i64,
    pub fuzz: f64,
    pub ivl_fct: f64,
    pub max_ivl: i64,
    pub ease4: f64,
    pub bury: bool,
    pub min_space: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardOptions {
    pub per_day: i64,
    pub delays: Vec<i64>,
    pub separate: bool,
    pub ints: Vec<i64>,
    pub initial_factor: i64,
    pub bury: bool,
    pub order: i64,
}

/// A deck options group of `col.dconf`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckOptions {
    pub name: String,
    pub replayq: bool,
    pub lapse: LapseOptions,
    pub rev: ReviewOptions,
    pub timer: i64,
    pub max_taken: i64,
    pub usn: i64,
    pub new: NewCardOptions,
    #[serde(rename = "mod")]
    pub modified: i64,
    pub id: i64,
    pub autoplay: bool,
}

impl Default for DeckOptions {
    fn default() -> Self {
        Self {
            name: "Default".to_string(),
            replayq: true,
            lapse: LapseOptions {
                leech_fails: 8,
                min_int: 1,
                delays: vec![10],
                leech_action: 0,
                mult: 0.0,
            },
            rev: ReviewOptions {
                per_day: 100,
                fuzz: 0.05,
                ivl_fct: 1.0,
                max_ivl: 36500,
                ease4: 1.3,
                bury: true,
                min_space: 1,
            },
            timer: 0,
            max_taken: 60,
            usn: 0,
            new: NewCardOptions {
                per_day: 20,
                delays: vec![1, 10],
                separate: true,
                ints: vec![1, 4, 7],
                initial_factor: 2500,
                bury: true,
                order: 1,
            },
            modified: 0,
            id: 1,
            autoplay: true,
        }
    }
}

/// Everything seeded into a fresh collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSeed {
    pub conf: CollectionConf,
    pub models: BTreeMap<String, ModelDefinition>,
    pub decks: BTreeMap<String, DeckDefinition>,
    pub dconf: BTreeMap<String, DeckOptions>,
}

impl CollectionSeed {
    /// Seed with one placeholder model, the "Default" deck and one
    /// placeholder deck to be renamed.
    pub fn new(opts: &TemplateOptions) -> Self {
        let mut models = BTreeMap::new();
        models.insert(SEED_MODEL_ID.to_string(), ModelDefinition::basic(opts));

        let mut decks = BTreeMap::new();
        decks.insert(
            DEFAULT_DECK_KEY.to_string(),
            DeckDefinition::new(1, "Default", 0, 0, 1435645724),
        );
        decks.insert(
            SEED_DECK_ID.to_string(),
            DeckDefinition::new(SEED_DECK_ID, "Template", -1, 545, 1435588830),
        );

        let mut dconf = BTreeMap::new();
        dconf.insert(DEFAULT_DECK_KEY.to_string(), DeckOptions::default());

        Self {
            conf: CollectionConf::default(),
            models,
            decks,
            dconf,
        }
    }

    /// Render the complete bootstrap script for an empty database.
    pub fn to_script(&self) -> Result<String> {
        let conf = serde_json::to_string(&self.conf)?;
        let models = serde_json::to_string(&self.models)?;
        let decks = serde_json::to_string(&self.decks)?;
        let dconf = serde_json::to_string(&self.dconf)?;

        Ok(format!(
            r#"
    PRAGMA foreign_keys=OFF;
    BEGIN TRANSACTION;
    {tables}
    INSERT INTO "col" VALUES(
      1,
      1388548800,
      1435645724219,
      1435645724215,
      {version},
      0,
      0,
      0,
      {conf},
      {models},
      {decks},
      {dconf},
      '{{}}'
    );
    {indexes}
    COMMIT;
  "#,
            tables = TABLES,
            version = SCHEMA_VERSION,
            conf = sql_literal(&conf),
            models = sql_literal(&models),
            decks = sql_literal(&decks),
            dconf = sql_literal(&dconf),
            indexes = INDEXES,
        ))
    }
}

/// Bootstrap script for the given template options.
pub fn bootstrap_script(opts: &TemplateOptions) -> Result<String> {
    CollectionSeed::new(opts).to_script()
}

/// Quote `value` as an SQL string literal.
fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn or_default(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => default.to_string(),
    }
}
