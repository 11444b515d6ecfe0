use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

pub fn init_db(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create parent dir: {}", parent.display()))?;
    }

    let conn = open_connection(db_path)?;

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS spreadsheet (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            source_path TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE TABLE IF NOT EXISTS worksheet (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            spreadsheet_id INTEGER NOT NULL,
            title          TEXT NOT NULL,
            UNIQUE (spreadsheet_id, title),
            FOREIGN KEY (spreadsheet_id) REFERENCES spreadsheet(id)
        );

        CREATE TABLE IF NOT EXISTS cell (
            worksheet_id INTEGER NOT NULL,
            row_idx      INTEGER NOT NULL,
            col_idx      INTEGER NOT NULL,
            value        TEXT NOT NULL,
            PRIMARY KEY (worksheet_id, row_idx, col_idx),
            FOREIGN KEY (worksheet_id) REFERENCES worksheet(id)
        );

        CREATE INDEX IF NOT EXISTS idx_cell_worksheet_row
            ON cell(worksheet_id, row_idx);
        ",
    )
    .context("failed to initialize schema")?;

    Ok(())
}
