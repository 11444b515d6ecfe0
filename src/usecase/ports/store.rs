use std::collections::HashSet;
use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::record::{CellValue, RowIndex, RowMap};
use crate::domain::entities::target::SheetTarget;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("找不到：{0}")]
    NotFound(String),
    #[error("沒有權限：{0}")]
    PermissionDenied(String),
    #[error("HTTP {status}：{message}")]
    Http { status: u16, message: String },
    #[error("連線失敗：{0}")]
    Transport(String),
    #[error("回應格式錯誤：{0}")]
    Decode(String),
    #[error("本機儲存失敗：{0}")]
    Storage(String),
    #[error("列 {0} 超出工作表範圍")]
    RowOutOfRange(u32),
}

/// Authenticates against the sheet service and opens spreadsheets.
pub trait Connector: Send + Sync {
    /// Account the service sees, shown when a spreadsheet cannot be opened.
    fn identity(&self) -> String;

    fn open(&self, target: &SheetTarget) -> Result<Box<dyn Spreadsheet>, StoreError>;
}

pub trait Spreadsheet: Send + Sync {
    fn title(&self) -> String;

    fn worksheet(&self, name: &str) -> Result<Arc<dyn Worksheet>, StoreError>;
}

/// Row-oriented access to one worksheet. Rows are 1-based and row 1 is the header row.
pub trait Worksheet: Send + Sync {
    fn title(&self) -> String;

    fn get_all_records(&self) -> Result<Vec<RowMap>, StoreError>;
    fn append_row(&self, values: &[CellValue]) -> Result<(), StoreError>;
    fn update_cell(&self, row: RowIndex, col: u32, value: CellValue) -> Result<(), StoreError>;
    fn delete_rows(&self, row: RowIndex) -> Result<(), StoreError>;
}

/// Column names of a header row. Trailing blank cells are dropped; a name used twice
/// would collapse two columns into one key, so it is refused.
pub fn header_names(row: Vec<String>) -> Result<Vec<String>, StoreError> {
    let width = row
        .iter()
        .rposition(|name| !name.is_empty())
        .map(|last| last + 1)
        .unwrap_or(0);
    let mut names = row;
    names.truncate(width);

    let mut seen = HashSet::new();
    if let Some(duplicate) = names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(StoreError::Decode(format!(
            "標題列的欄位名稱重複：「{duplicate}」"
        )));
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn header_names_drop_trailing_blanks() {
        assert_eq!(
            header_names(names(&["姓名", "數量", "", ""])),
            Ok(names(&["姓名", "數量"]))
        );
        assert_eq!(header_names(names(&["", ""])), Ok(Vec::new()));
    }

    #[test]
    fn header_names_refuse_duplicates() {
        assert!(matches!(
            header_names(names(&["姓名", "數量", "姓名"])),
            Err(StoreError::Decode(message)) if message.contains("姓名")
        ));
        assert!(matches!(
            header_names(names(&["姓名", "", "", "數量"])),
            Err(StoreError::Decode(_))
        ));
    }
}
