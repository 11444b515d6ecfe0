use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, OptionalExtension};

use crate::domain::entities::record::{CellValue, RowMap, HEADER_ROWS};
use crate::infra::sqlite::schema::{init_db, open_connection};
use crate::usecase::ports::store::{header_names, StoreError};

// row_idx and col_idx are stored 1-based, the same numbering the sheet contract uses.

pub fn find_spreadsheet(db_path: &Path, name: &str) -> Result<Option<(i64, String)>> {
    init_db(db_path)?;
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT id, name FROM spreadsheet WHERE name = ?1",
        params![name],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
    .with_context(|| format!("failed to look up spreadsheet: {name}"))
}

pub fn find_worksheet(db_path: &Path, spreadsheet_id: i64, title: &str) -> Result<Option<i64>> {
    let conn = open_connection(db_path)?;
    conn.query_row(
        "SELECT id FROM worksheet WHERE spreadsheet_id = ?1 AND title = ?2",
        params![spreadsheet_id, title],
        |row| row.get(0),
    )
    .optional()
    .with_context(|| format!("failed to look up worksheet: {title}"))
}

pub fn list_worksheet_titles(db_path: &Path, spreadsheet_id: i64) -> Result<Vec<String>> {
    let conn = open_connection(db_path)?;
    let mut stmt = conn
        .prepare("SELECT title FROM worksheet WHERE spreadsheet_id = ?1 ORDER BY id ASC")
        .context("failed to prepare worksheet list query")?;
    let titles = stmt
        .query_map(params![spreadsheet_id], |row| row.get(0))
        .context("failed to query worksheets")?
        .collect::<rusqlite::Result<Vec<String>>>()
        .context("failed to collect worksheets")?;
    Ok(titles)
}

/// Creates a spreadsheet with one worksheet holding `headers` in row 1 and `rows` below it.
pub fn create_spreadsheet(
    db_path: &Path,
    name: &str,
    source_path: &str,
    worksheet_title: &str,
    headers: &[String],
    rows: &[Vec<String>],
) -> Result<i64> {
    init_db(db_path)?;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start spreadsheet create transaction")?;

    tx.execute(
        "INSERT INTO spreadsheet(name, source_path) VALUES (?1, ?2)",
        params![name, source_path],
    )
    .with_context(|| format!("failed to insert spreadsheet: {name}"))?;
    let spreadsheet_id = tx.last_insert_rowid();

    tx.execute(
        "INSERT INTO worksheet(spreadsheet_id, title) VALUES (?1, ?2)",
        params![spreadsheet_id, worksheet_title],
    )
    .with_context(|| format!("failed to insert worksheet: {worksheet_title}"))?;
    let worksheet_id = tx.last_insert_rowid();

    let mut insert_cell = tx
        .prepare(
            "INSERT INTO cell(worksheet_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)",
        )
        .context("failed to prepare cell insert")?;
    for (row_pos, row) in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)).enumerate() {
        for (col_pos, value) in row.iter().enumerate() {
            insert_cell
                .execute(params![
                    worksheet_id,
                    row_pos as i64 + 1,
                    col_pos as i64 + 1,
                    value
                ])
                .context("failed to insert worksheet cell")?;
        }
    }
    drop(insert_cell);

    tx.commit().context("failed to commit spreadsheet create")?;
    Ok(worksheet_id)
}

/// Every row from 1 to the last row holding a cell, padded to the widest row.
pub fn load_grid(db_path: &Path, worksheet_id: i64) -> Result<Vec<Vec<String>>> {
    let conn = open_connection(db_path)?;
    let (max_row, max_col): (i64, i64) = conn
        .query_row(
            "SELECT COALESCE(MAX(row_idx), 0), COALESCE(MAX(col_idx), 0)
             FROM cell WHERE worksheet_id = ?1",
            params![worksheet_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .context("failed to read worksheet bounds")?;

    let mut grid = vec![vec![String::new(); max_col as usize]; max_row as usize];

    let mut stmt = conn
        .prepare(
            "SELECT row_idx, col_idx, value FROM cell
             WHERE worksheet_id = ?1
             ORDER BY row_idx ASC, col_idx ASC",
        )
        .context("failed to prepare cell query")?;
    let mut rows = stmt
        .query(params![worksheet_id])
        .context("failed to run cell query")?;

    while let Some(row) = rows.next().context("failed to read cell")? {
        let row_idx: i64 = row.get(0).context("failed to read row_idx")?;
        let col_idx: i64 = row.get(1).context("failed to read col_idx")?;
        let value: String = row.get(2).context("failed to read value")?;

        if let Some(dest_cell) = grid
            .get_mut(row_idx as usize - 1)
            .and_then(|dest_row| dest_row.get_mut(col_idx as usize - 1))
        {
            *dest_cell = value;
        }
    }

    Ok(grid)
}

pub fn last_row(db_path: &Path, worksheet_id: i64) -> Result<u32> {
    let conn = open_connection(db_path)?;
    let last: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(row_idx), 0) FROM cell
             WHERE worksheet_id = ?1 AND value <> ''",
            params![worksheet_id],
            |row| row.get(0),
        )
        .context("failed to read last row")?;
    Ok(last as u32)
}

/// Writes `values` into the row after the last non-empty one and returns that row.
pub fn append_row(db_path: &Path, worksheet_id: i64, values: &[String]) -> Result<u32> {
    let target_row = last_row(db_path, worksheet_id)? + 1;
    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start append transaction")?;

    tx.execute(
        "DELETE FROM cell WHERE worksheet_id = ?1 AND row_idx = ?2",
        params![worksheet_id, target_row],
    )
    .context("failed to clear append target row")?;

    let mut insert_cell = tx
        .prepare(
            "INSERT INTO cell(worksheet_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)",
        )
        .context("failed to prepare cell insert")?;
    for (col_pos, value) in values.iter().enumerate() {
        insert_cell
            .execute(params![worksheet_id, target_row, col_pos as i64 + 1, value])
            .context("failed to insert appended cell")?;
    }
    drop(insert_cell);

    tx.commit().context("failed to commit append")?;
    Ok(target_row)
}

pub fn update_cell(
    db_path: &Path,
    worksheet_id: i64,
    row: u32,
    col: u32,
    value: &str,
) -> Result<()> {
    let conn = open_connection(db_path)?;
    conn.execute(
        "INSERT INTO cell(worksheet_id, row_idx, col_idx, value) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(worksheet_id, row_idx, col_idx) DO UPDATE SET value = excluded.value",
        params![worksheet_id, row, col, value],
    )
    .with_context(|| format!("failed to update cell ({row}, {col})"))?;
    Ok(())
}

/// Removes `row` and shifts every later row up by one. Returns false if `row` is past the end.
pub fn delete_row(db_path: &Path, worksheet_id: i64, row: u32) -> Result<bool> {
    let max_row: i64 = {
        let conn = open_connection(db_path)?;
        conn.query_row(
            "SELECT COALESCE(MAX(row_idx), 0) FROM cell WHERE worksheet_id = ?1",
            params![worksheet_id],
            |r| r.get(0),
        )
        .context("failed to read worksheet bounds")?
    };
    if row == 0 || i64::from(row) > max_row {
        return Ok(false);
    }

    let mut conn = open_connection(db_path)?;
    let tx = conn
        .transaction()
        .context("failed to start delete transaction")?;

    tx.execute(
        "DELETE FROM cell WHERE worksheet_id = ?1 AND row_idx = ?2",
        params![worksheet_id, row],
    )
    .with_context(|| format!("failed to delete row {row}"))?;
    // Shift through negative indices so the primary key never collides mid-update.
    tx.execute(
        "UPDATE cell SET row_idx = -(row_idx - 1) WHERE worksheet_id = ?1 AND row_idx > ?2",
        params![worksheet_id, row],
    )
    .context("failed to shift rows")?;
    tx.execute(
        "UPDATE cell SET row_idx = -row_idx WHERE worksheet_id = ?1 AND row_idx < 0",
        params![worksheet_id],
    )
    .context("failed to settle shifted rows")?;

    tx.commit().context("failed to commit delete")?;
    Ok(true)
}

/// Turns a raw grid into header-keyed records. Trailing blank rows are dropped,
/// cells missing under a header read as empty text and cells past the last header are ignored.
pub fn records_from_grid(grid: &[Vec<String>]) -> Result<Vec<RowMap>, StoreError> {
    let header_rows = HEADER_ROWS as usize;
    let Some(header_row) = grid.get(header_rows - 1) else {
        return Ok(Vec::new());
    };
    let headers = header_names(header_row.clone())?;

    let data = grid.get(header_rows..).unwrap_or_default();
    let used = data
        .iter()
        .rposition(|row| row.iter().take(headers.len()).any(|value| !value.is_empty()))
        .map(|last| last + 1)
        .unwrap_or(0);

    Ok(data[..used]
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(col_pos, header)| {
                    let raw = row.get(col_pos).map(String::as_str).unwrap_or("");
                    (header.clone(), CellValue::numericise(raw))
                })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|v| v.to_string()).collect())
            .collect()
    }

    #[test]
    fn records_from_grid_keys_by_header_and_pads_missing_cells() {
        let records = records_from_grid(&grid(&[
            &["姓名", "數量", "備註"],
            &["Alice", "3"],
            &["Bob", "5", "vip"],
        ]))
        .expect("grid should convert");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["數量"], CellValue::Int(3));
        assert_eq!(records[0]["備註"], CellValue::from(""));
        assert_eq!(records[1]["備註"], CellValue::from("vip"));
    }

    #[test]
    fn records_from_grid_drops_trailing_blank_rows_only() {
        let records = records_from_grid(&grid(&[
            &["姓名", "數量"],
            &["Alice", "3"],
            &["", ""],
            &["Bob", "5"],
            &["", ""],
            &[],
        ]))
        .expect("grid should convert");

        assert_eq!(records.len(), 3, "inner blank row keeps its position");
        assert_eq!(records[1]["姓名"], CellValue::from(""));
        assert_eq!(records[2]["姓名"], CellValue::from("Bob"));
    }

    #[test]
    fn records_from_grid_handles_header_only_and_empty_sheets() {
        assert_eq!(records_from_grid(&grid(&[&["姓名", "數量"]])), Ok(Vec::new()));
        assert_eq!(records_from_grid(&[]), Ok(Vec::new()));
    }

    #[test]
    fn records_from_grid_ignores_cells_past_last_header() {
        // load_grid pads the header row with "" up to the widest data row.
        let records = records_from_grid(&grid(&[
            &["姓名", "數量", ""],
            &["Alice", "3", "stray"],
            &["", "", "stray"],
        ]))
        .expect("grid should convert");

        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].keys().cloned().collect::<Vec<_>>(),
            vec!["姓名".to_string(), "數量".to_string()]
        );
    }

    #[test]
    fn records_from_grid_refuses_duplicate_headers() {
        let result = records_from_grid(&grid(&[&["姓名", "姓名"], &["Alice", "Bob"]]));

        assert!(matches!(result, Err(StoreError::Decode(_))));
    }
}
