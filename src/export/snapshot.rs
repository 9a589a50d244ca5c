//! Copy the in-memory collection into a standalone SQLite file.

use std::fs;

use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tempfile::NamedTempFile;

use crate::deck::{DeckError, Result};

/// Tables whose rows make up a collection.
const COLLECTION_TABLES: [&str; 5] = ["col", "notes", "cards", "revlog", "graves"];

/// Serialize `source` to the bytes of an on-disk database.
///
/// The temporary file is removed when this returns, on success or error.
pub fn snapshot_database(source: &Connection) -> Result<Vec<u8>> {
    let file = NamedTempFile::new()?;
    let dest = Connection::open(file.path())?;

    replay_schema(source, &dest)?;
    for table in COLLECTION_TABLES {
        copy_table(source, &dest, table)?;
    }

    dest.close().map_err(|(_, err)| DeckError::Sqlite(err))?;
    let bytes = fs::read(file.path())?;
    log::debug!("Snapshot database is {} bytes", bytes.len());
    Ok(bytes)
}

/// Recreate tables and indexes, tables first. Failed statements are skipped.
fn replay_schema(source: &Connection, dest: &Connection) -> Result<()> {
    let mut stmt = source.prepare(
        "SELECT name, sql FROM sqlite_master
         WHERE type IN ('table', 'index')
           AND sql IS NOT NULL
           AND name NOT LIKE 'sqlite_%'
         ORDER BY CASE type WHEN 'table' THEN 0 ELSE 1 END, rowid",
    )?;
    let statements = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for (name, sql) in statements {
        if let Err(err) = dest.execute_batch(&sql) {
            log::warn!("Skipping schema object '{}': {}", name, err);
        }
    }
    Ok(())
}

/// Copy every row of `table`. Absent or empty tables are skipped.
fn copy_table(source: &Connection, dest: &Connection, table: &str) -> Result<()> {
    let exists: bool = source.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
        params![table],
        |row| row.get(0),
    )?;
    if !exists {
        log::debug!("Table '{}' not present, skipping", table);
        return Ok(());
    }

    let count: i64 = source.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })?;
    if count == 0 {
        log::debug!("Table '{}' is empty, skipping", table);
        return Ok(());
    }

    let mut select = source.prepare(&format!("SELECT * FROM {}", table))?;
    let width = select.column_count();
    let placeholders = (1..=width)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    let mut insert = dest.prepare(&format!("INSERT INTO {} VALUES ({})", table, placeholders))?;

    let mut rows = select.query([])?;
    while let Some(row) = rows.next()? {
        let values = (0..width)
            .map(|i| row.get::<_, Value>(i))
            .collect::<rusqlite::Result<Vec<_>>>()?;
        insert.execute(params_from_iter(values))?;
    }

    log::debug!("Copied {} rows from '{}'", count, table);
    Ok(())
}
