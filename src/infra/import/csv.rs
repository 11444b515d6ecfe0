use std::path::Path;

use anyhow::{Context, Result};

use crate::infra::import::SeedTable;

pub fn read_csv_table(csv_path: &Path) -> Result<SeedTable> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from csv: {}", csv_path.display()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();

    if headers.is_empty() {
        anyhow::bail!("csv header is required")
    }

    let header_len = headers.len();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("failed to parse csv record")?;
        rows.push(
            (0..header_len)
                .map(|col_idx| record.get(col_idx).unwrap_or("").to_string())
                .collect(),
        );
    }

    Ok(SeedTable { headers, rows })
}
