use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::domain::entities::form::{RecordDraft, ValidRecord, ValidationError};
use crate::domain::entities::record::{CellValue, RowIndex, Snapshot};
use crate::usecase::ports::store::{StoreError, Worksheet};

const LABEL_COL: u32 = 1;
const QUANTITY_COL: u32 = 2;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoardError {
    #[error("{0}")]
    Validation(#[from] ValidationError),
    #[error("第 {0} 列不在目前的資料中，請重新整理後再試")]
    UnknownRow(RowIndex),
    #[error("第 {0} 列已被其他人修改，請重新整理後再試")]
    StaleRow(RowIndex),
    #[error("試算表第 {position} 欄的標題是「{found}」，但設定的欄位名稱是「{expected}」")]
    ColumnMismatch {
        position: u32,
        expected: String,
        found: String,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Column names of the label and quantity fields. They must be the first and second
/// headers, since writes address columns 1 and 2 by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardColumns {
    pub label: String,
    pub quantity: String,
}

impl Default for BoardColumns {
    fn default() -> Self {
        Self {
            label: "姓名".to_string(),
            quantity: "數量".to_string(),
        }
    }
}

/// What to do when a mutation targets a row that may have moved since the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowCheck {
    /// Write straight away; the last remote write wins.
    #[default]
    Trust,
    /// Re-read the sheet first and refuse if the row no longer matches.
    Verify,
}

pub struct RecordBoard {
    sheet: Arc<dyn Worksheet>,
    columns: BoardColumns,
    row_check: RowCheck,
}

impl RecordBoard {
    pub fn new(sheet: Arc<dyn Worksheet>, columns: BoardColumns, row_check: RowCheck) -> Self {
        Self {
            sheet,
            columns,
            row_check,
        }
    }

    pub fn columns(&self) -> &BoardColumns {
        &self.columns
    }

    pub fn list(&self) -> Result<Snapshot, BoardError> {
        let snapshot = Snapshot::from_rows(self.sheet.get_all_records()?);
        info!(sheet = %self.sheet.title(), rows = snapshot.len(), "fetched snapshot");
        self.check_layout(&snapshot)?;
        Ok(snapshot)
    }

    pub fn create(&self, draft: &RecordDraft) -> Result<Snapshot, BoardError> {
        let record = validated(draft)?;
        self.sheet.append_row(&[
            CellValue::Text(record.label.clone()),
            CellValue::Int(record.quantity),
        ])?;
        info!(label = %record.label, quantity = record.quantity, "appended row");
        self.list()
    }

    pub fn update(
        &self,
        snapshot: &Snapshot,
        row: RowIndex,
        draft: &RecordDraft,
    ) -> Result<Snapshot, BoardError> {
        let record = validated(draft)?;
        self.check_row(snapshot, row)?;

        self.sheet
            .update_cell(row, LABEL_COL, CellValue::Text(record.label.clone()))?;
        self.sheet
            .update_cell(row, QUANTITY_COL, CellValue::Int(record.quantity))?;
        info!(%row, label = %record.label, quantity = record.quantity, "updated row");
        self.list()
    }

    pub fn delete(&self, snapshot: &Snapshot, row: RowIndex) -> Result<Snapshot, BoardError> {
        self.check_row(snapshot, row)?;

        self.sheet.delete_rows(row)?;
        info!(%row, "deleted row");
        self.list()
    }

    /// A header-only sheet carries no header names in its records, so only a
    /// non-empty snapshot can be checked.
    fn check_layout(&self, snapshot: &Snapshot) -> Result<(), BoardError> {
        if snapshot.is_empty() {
            return Ok(());
        }
        let expected = [
            (LABEL_COL, &self.columns.label),
            (QUANTITY_COL, &self.columns.quantity),
        ];
        for (position, name) in expected {
            let found = snapshot
                .headers()
                .get(position as usize - 1)
                .map(String::as_str)
                .unwrap_or("");
            if found != name.as_str() {
                warn!(position, expected = %name, found, "column layout does not match config");
                return Err(BoardError::ColumnMismatch {
                    position,
                    expected: name.clone(),
                    found: found.to_string(),
                });
            }
        }
        Ok(())
    }

    fn check_row(&self, snapshot: &Snapshot, row: RowIndex) -> Result<(), BoardError> {
        self.check_layout(snapshot)?;
        let Some(expected) = snapshot.record(row) else {
            return Err(BoardError::UnknownRow(row));
        };

        if self.row_check == RowCheck::Verify {
            let latest = Snapshot::from_rows(self.sheet.get_all_records()?);
            if latest.record(row).map(|r| &r.values) != Some(&expected.values) {
                warn!(%row, "row changed since snapshot");
                return Err(BoardError::StaleRow(row));
            }
        }

        Ok(())
    }
}

fn validated(draft: &RecordDraft) -> Result<ValidRecord, BoardError> {
    draft.validate().map_err(|err| {
        warn!(%err, "rejected form input");
        BoardError::Validation(err)
    })
}
