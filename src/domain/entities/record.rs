use std::fmt;

use chrono::{DateTime, Local};
use indexmap::IndexMap;

/// Rows above the first data row. Row 1 holds the column names.
pub const HEADER_ROWS: u32 = 1;
pub const FIRST_DATA_ROW: u32 = HEADER_ROWS + 1;

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Reads a raw cell the way the sheet service reports it: integer and
    /// float literals become numbers, everything else stays text.
    pub fn numericise(raw: &str) -> Self {
        if let Ok(value) = raw.parse::<i64>() {
            return CellValue::Int(value);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && !raw.trim().is_empty() => CellValue::Float(value),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(value) => Some(*value),
            CellValue::Float(value) if value.fract() == 0.0 => Some(*value as i64),
            CellValue::Float(_) => None,
            CellValue::Text(text) => text.trim().parse::<i64>().ok(),
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, CellValue::Text(text) if text.is_empty())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(value) => write!(f, "{value}"),
            CellValue::Float(value) => write!(f, "{value}"),
            CellValue::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

/// One sheet row keyed by header, in column order.
pub type RowMap = IndexMap<String, CellValue>;

/// 1-based sheet row number, header row included in the count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowIndex(pub u32);

impl RowIndex {
    /// Row number of the data record at `position` (0-based) in a fetched sequence.
    pub fn for_position(position: usize) -> Self {
        RowIndex(position as u32 + FIRST_DATA_ROW)
    }

    /// Inverse of [`RowIndex::for_position`]; `None` for the header row.
    pub fn position(self) -> Option<usize> {
        self.0
            .checked_sub(FIRST_DATA_ROW)
            .map(|offset| offset as usize)
    }
}

impl fmt::Display for RowIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub row_index: RowIndex,
    pub values: RowMap,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.values.get(column)
    }

    pub fn text(&self, column: &str) -> String {
        self.get(column).map(|value| value.to_string()).unwrap_or_default()
    }
}

/// Everything one read returned. Never patched; a mutation is observed by fetching again.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    headers: Vec<String>,
    records: Vec<Record>,
    fetched_at: DateTime<Local>,
}

impl Snapshot {
    pub fn from_rows(rows: Vec<RowMap>) -> Self {
        let headers = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(position, values)| Record {
                row_index: RowIndex::for_position(position),
                values,
            })
            .collect();

        Self {
            headers,
            records,
            fetched_at: Local::now(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn fetched_at(&self) -> DateTime<Local> {
        self.fetched_at
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn record(&self, row_index: RowIndex) -> Option<&Record> {
        row_index
            .position()
            .and_then(|position| self.records.get(position))
    }

    pub fn row_options(&self, label_column: &str) -> Vec<RowOption> {
        self.records
            .iter()
            .map(|record| RowOption {
                row_index: record.row_index,
                label: row_option_label(record.row_index, &record.text(label_column)),
            })
            .collect()
    }
}

/// A selector entry pointing at a record of the snapshot it was built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOption {
    pub row_index: RowIndex,
    pub label: String,
}

pub fn row_option_label(row_index: RowIndex, primary: &str) -> String {
    format!("第 {row_index} 列: {primary}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, qty: i64) -> RowMap {
        let mut map = RowMap::new();
        map.insert("姓名".to_string(), CellValue::from(name));
        map.insert("數量".to_string(), CellValue::Int(qty));
        map
    }

    #[test]
    fn numericise_detects_ints_floats_and_text() {
        assert_eq!(CellValue::numericise("3"), CellValue::Int(3));
        assert_eq!(CellValue::numericise("-7"), CellValue::Int(-7));
        assert_eq!(CellValue::numericise("2.5"), CellValue::Float(2.5));
        assert_eq!(CellValue::numericise("Alice"), CellValue::from("Alice"));
        assert_eq!(CellValue::numericise(""), CellValue::from(""));
        assert_eq!(CellValue::numericise("inf"), CellValue::from("inf"));
    }

    #[test]
    fn snapshot_assigns_row_indices_from_two() {
        let snapshot = Snapshot::from_rows(vec![row("Alice", 3), row("Bob", 5), row("Cara", 1)]);

        assert_eq!(
            snapshot
                .records()
                .iter()
                .map(|record| record.row_index)
                .collect::<Vec<_>>(),
            vec![RowIndex(2), RowIndex(3), RowIndex(4)]
        );
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.headers(), ["姓名".to_string(), "數量".to_string()]);
        assert_eq!(
            snapshot.record(RowIndex(3)).map(|r| r.text("姓名")),
            Some("Bob".to_string())
        );
        assert!(snapshot.record(RowIndex(1)).is_none(), "header row is not a record");
        assert!(snapshot.record(RowIndex(5)).is_none());
    }

    #[test]
    fn empty_snapshot_has_no_headers() {
        let snapshot = Snapshot::from_rows(Vec::new());
        assert!(snapshot.is_empty());
        assert!(snapshot.headers().is_empty());
        assert!(snapshot.row_options("姓名").is_empty());
    }

    #[test]
    fn row_options_use_row_index_and_label() {
        let snapshot = Snapshot::from_rows(vec![row("Alice", 3), row("Bob", 5)]);
        let options = snapshot.row_options("姓名");

        assert_eq!(options[0].label, "第 2 列: Alice");
        assert_eq!(options[1].label, "第 3 列: Bob");
        assert_eq!(options[1].row_index, RowIndex(3));
    }

    #[test]
    fn as_i64_accepts_integral_values_only() {
        assert_eq!(CellValue::Int(4).as_i64(), Some(4));
        assert_eq!(CellValue::Float(4.0).as_i64(), Some(4));
        assert_eq!(CellValue::Float(4.5).as_i64(), None);
        assert_eq!(CellValue::from(" 12 ").as_i64(), Some(12));
        assert_eq!(CellValue::from("x").as_i64(), None);
    }
}
