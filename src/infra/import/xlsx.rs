use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Reader};

use crate::infra::import::SeedTable;

pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::String(v) => v.to_string(),
        Data::Float(v) => v.to_string(),
        Data::Int(v) => v.to_string(),
        Data::Bool(v) => v.to_string(),
        Data::DateTime(v) => v.to_string(),
        Data::DateTimeIso(v) => v.to_string(),
        Data::DurationIso(v) => v.to_string(),
        Data::Error(v) => format!("{v:?}"),
        Data::Empty => String::new(),
    }
}

/// Reads the first sheet; its first row becomes the header row.
pub fn read_xlsx_table(xlsx_path: &Path) -> Result<SeedTable> {
    let mut workbook = open_workbook_auto(xlsx_path)
        .with_context(|| format!("failed to open xlsx: {}", xlsx_path.display()))?;
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("xlsx has no sheets: {}", xlsx_path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    let mut rows = range
        .rows()
        .map(|r| r.iter().map(cell_to_string).collect::<Vec<_>>());
    let headers = rows
        .next()
        .filter(|headers| headers.iter().any(|h| !h.is_empty()))
        .with_context(|| format!("xlsx header is required: {sheet_name}"))?;

    Ok(SeedTable {
        headers,
        rows: rows.collect(),
    })
}
