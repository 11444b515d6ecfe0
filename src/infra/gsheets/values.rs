use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::entities::record::{CellValue, RowMap};
use crate::usecase::ports::store::{header_names, StoreError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpreadsheetMeta {
    pub spreadsheet_id: String,
    pub properties: SpreadsheetProperties,
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub struct SpreadsheetProperties {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    pub sheet_id: i64,
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct DriveFileList {
    #[serde(default)]
    pub files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub range: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl ValueRange {
    pub fn single_row(range: Option<String>, row: &[CellValue]) -> Self {
        Self {
            range,
            major_dimension: Some("ROWS".to_string()),
            values: vec![row.iter().map(cell_to_json).collect()],
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Human-readable part of an error response, falling back to the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .ok()
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

/// Numbers stay numbers and numeric-looking text becomes a number too, so both backends
/// hand the board the same values for the same sheet.
pub fn json_to_cell(value: &Value) -> CellValue {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(CellValue::Int)
            .or_else(|| number.as_f64().map(CellValue::Float))
            .unwrap_or_else(|| CellValue::Text(number.to_string())),
        Value::String(text) => CellValue::numericise(text),
        Value::Bool(flag) => CellValue::Text(if *flag { "TRUE" } else { "FALSE" }.to_string()),
        Value::Null => CellValue::Text(String::new()),
        other => CellValue::Text(other.to_string()),
    }
}

pub fn cell_to_json(value: &CellValue) -> Value {
    match value {
        CellValue::Int(number) => json!(number),
        CellValue::Float(number) => json!(number),
        CellValue::Text(text) => json!(text),
    }
}

/// Header-keyed records from a `values.get` response. Row 1 is the header row.
pub fn records_from_values(values: &[Vec<Value>]) -> Result<Vec<RowMap>, StoreError> {
    let Some((header_row, data)) = values.split_first() else {
        return Ok(Vec::new());
    };
    let headers = header_names(
        header_row
            .iter()
            .map(|header| json_to_cell(header).to_string())
            .collect(),
    )?;

    let is_blank = |row: &Vec<Value>| {
        row.iter()
            .take(headers.len())
            .all(|value| json_to_cell(value).is_blank())
    };
    let used = data
        .iter()
        .rposition(|row| !is_blank(row))
        .map(|last| last + 1)
        .unwrap_or(0);

    Ok(data[..used]
        .iter()
        .map(|row| {
            headers
                .iter()
                .enumerate()
                .map(|(col_pos, header)| {
                    let value = row
                        .get(col_pos)
                        .map(json_to_cell)
                        .unwrap_or_else(|| CellValue::Text(String::new()));
                    (header.clone(), value)
                })
                .collect()
        })
        .collect())
}

pub fn delete_row_request(sheet_id: i64, row: u32) -> Value {
    json!({
        "requests": [{
            "deleteDimension": {
                "range": {
                    "sheetId": sheet_id,
                    "dimension": "ROWS",
                    "startIndex": row - 1,
                    "endIndex": row,
                }
            }
        }]
    })
}

pub fn drive_name_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{escaped}' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
    )
}
