pub mod csv;
pub mod xlsx;

use std::path::Path;

use anyhow::Result;

use crate::infra::import::csv::read_csv_table;
use crate::infra::import::xlsx::read_xlsx_table;
use crate::infra::sqlite::queries::create_spreadsheet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_seed_table(path: &Path) -> Result<SeedTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "xlsx" {
        read_xlsx_table(path)
    } else {
        read_csv_table(path)
    }
}

/// Creates spreadsheet `name` with a single worksheet filled from `path`.
pub fn seed_spreadsheet(db_path: &Path, name: &str, worksheet: &str, path: &Path) -> Result<i64> {
    let table = read_seed_table(path)?;
    let source_path = path.to_string_lossy().into_owned();
    create_spreadsheet(
        db_path,
        name,
        &source_path,
        worksheet,
        &table.headers,
        &table.rows,
    )
}
