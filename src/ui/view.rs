use crate::domain::entities::form::RecordDraft;
use crate::domain::entities::record::{RowIndex, RowOption, Snapshot};
use crate::usecase::services::board_service::BoardColumns;

pub const PAGE_TITLE: &str = "📊 Google Sheets 讀寫測試儀表板";
pub const ROW_INDEX_HEADER: &str = "試算表列數";
pub const EMPTY_SHEET_MESSAGE: &str =
    "目前工作表中沒有資料。請確保工作表的第一列有設定標題（例如：姓名, 數量）";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The snapshot as displayed: a leading row-number column, then every sheet column.
pub fn table_view(snapshot: &Snapshot) -> TableView {
    let headers = std::iter::once(ROW_INDEX_HEADER.to_string())
        .chain(snapshot.headers().iter().cloned())
        .collect();
    let rows = snapshot
        .records()
        .iter()
        .map(|record| {
            std::iter::once(record.row_index.to_string())
                .chain(snapshot.headers().iter().map(|header| record.text(header)))
                .collect()
        })
        .collect();
    TableView { headers, rows }
}

/// The option a selector shows: the remembered label if it still exists, else the first one.
pub fn resolve_selection<'a>(options: &'a [RowOption], selected: Option<&str>) -> Option<&'a RowOption> {
    selected
        .and_then(|label| options.iter().find(|option| option.label == label))
        .or_else(|| options.first())
}

/// Update-form values for `row`. A quantity that is not a whole number shows as 0.
pub fn prefill(snapshot: &Snapshot, row: RowIndex, columns: &BoardColumns) -> RecordDraft {
    let Some(record) = snapshot.record(row) else {
        return RecordDraft::default();
    };
    let quantity = record
        .get(&columns.quantity)
        .and_then(|value| value.as_i64())
        .unwrap_or(0);
    RecordDraft::new(record.text(&columns.label), quantity)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }
}

pub fn notice_style(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "padding: 10px 14px; border-radius: 6px; background: #e8f1fb; color: #0b4f8a; white-space: pre-wrap;",
        NoticeLevel::Success => "padding: 10px 14px; border-radius: 6px; background: #e7f6ec; color: #17693a; white-space: pre-wrap;",
        NoticeLevel::Warning => "padding: 10px 14px; border-radius: 6px; background: #fff6e0; color: #8a5a00; white-space: pre-wrap;",
        NoticeLevel::Error => "padding: 10px 14px; border-radius: 6px; background: #fdecec; color: #a12020; white-space: pre-wrap;",
    }
}

pub fn root_container_style() -> &'static str {
    "max-width: 960px; margin: 0 auto; padding: 16px 24px; font-family: sans-serif; display: flex; flex-direction: column; gap: 12px;"
}

pub fn table_container_style() -> &'static str {
    "max-height: 360px; overflow: auto; border: 1px solid #ddd; border-radius: 6px;"
}

pub fn table_header_cell_style() -> &'static str {
    "position: sticky; top: 0; z-index: 1; background: #f5f5f5; border-bottom: 1px solid #ccc; padding: 6px 10px; text-align: left; white-space: nowrap;"
}

pub fn table_cell_style() -> &'static str {
    "border-bottom: 1px solid #eee; padding: 6px 10px; white-space: nowrap;"
}

pub fn columns_style() -> &'static str {
    "display: grid; grid-template-columns: 1fr 1fr; gap: 24px; align-items: start;"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::record::{CellValue, RowMap};

    fn snapshot() -> Snapshot {
        let rows = [("Alice", CellValue::Int(3)), ("Bob", CellValue::from("很多"))]
            .into_iter()
            .map(|(name, qty)| {
                let mut row = RowMap::new();
                row.insert("姓名".to_string(), CellValue::from(name));
                row.insert("數量".to_string(), qty);
                row
            })
            .collect();
        Snapshot::from_rows(rows)
    }

    #[test]
    fn table_view_injects_row_index_column() {
        let view = table_view(&snapshot());

        assert_eq!(view.headers, vec!["試算表列數", "姓名", "數量"]);
        assert_eq!(view.rows[0], vec!["2", "Alice", "3"]);
        assert_eq!(view.rows[1], vec!["3", "Bob", "很多"]);
    }

    #[test]
    fn selection_keeps_existing_label_or_falls_back_to_first() {
        let options = snapshot().row_options("姓名");

        assert_eq!(
            resolve_selection(&options, Some("第 3 列: Bob")).map(|o| o.row_index),
            Some(RowIndex(3))
        );
        assert_eq!(
            resolve_selection(&options, Some("第 4 列: Cara")).map(|o| o.row_index),
            Some(RowIndex(2))
        );
        assert_eq!(
            resolve_selection(&options, None).map(|o| o.row_index),
            Some(RowIndex(2))
        );
        assert!(resolve_selection(&[], Some("第 2 列: Alice")).is_none());
    }

    #[test]
    fn prefill_reads_label_and_whole_quantity() {
        let columns = BoardColumns::default();
        let snapshot = snapshot();

        assert_eq!(
            prefill(&snapshot, RowIndex(2), &columns),
            RecordDraft::new("Alice", 3)
        );
        assert_eq!(
            prefill(&snapshot, RowIndex(3), &columns),
            RecordDraft::new("Bob", 0)
        );
        assert_eq!(prefill(&snapshot, RowIndex(9), &columns), RecordDraft::default());
    }

    #[test]
    fn sticky_header_styles_include_positioning() {
        let style = table_header_cell_style();

        assert!(style.contains("position: sticky"));
        assert!(style.contains("top: 0"));
        assert!(style.contains("z-index"));
    }

    #[test]
    fn table_container_style_allows_scroll() {
        assert!(table_container_style().contains("overflow: auto"));
    }
}
