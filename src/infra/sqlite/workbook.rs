use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::domain::entities::record::{CellValue, RowIndex, RowMap};
use crate::domain::entities::target::SheetTarget;
use crate::infra::import::seed_spreadsheet;
use crate::infra::sqlite::queries::{
    append_row, delete_row, find_spreadsheet, find_worksheet, list_worksheet_titles, load_grid,
    records_from_grid, update_cell,
};
use crate::usecase::ports::store::{Connector, Spreadsheet, StoreError, Worksheet};

fn storage_err(err: anyhow::Error) -> StoreError {
    StoreError::Storage(format!("{err:#}"))
}

/// File that fills a missing spreadsheet on first open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub path: PathBuf,
    pub worksheet: String,
}

/// Spreadsheets kept in a local SQLite file.
pub struct LocalConnector {
    pub db_path: PathBuf,
    pub seed: Option<Seed>,
}

impl LocalConnector {
    fn spreadsheet_name(target: &SheetTarget) -> String {
        match target {
            SheetTarget::Name(name) => name.clone(),
            SheetTarget::Url(url) => target
                .spreadsheet_key()
                .map(str::to_string)
                .unwrap_or_else(|| url.clone()),
        }
    }
}

impl Connector for LocalConnector {
    fn identity(&self) -> String {
        self.db_path.display().to_string()
    }

    fn open(&self, target: &SheetTarget) -> Result<Box<dyn Spreadsheet>, StoreError> {
        let name = Self::spreadsheet_name(target);
        let found = find_spreadsheet(&self.db_path, &name).map_err(storage_err)?;

        let (id, name) = match (found, &self.seed) {
            (Some(found), _) => found,
            (None, Some(seed)) => {
                seed_spreadsheet(&self.db_path, &name, &seed.worksheet, &seed.path)
                    .map_err(storage_err)?;
                info!(spreadsheet = %name, seed = %seed.path.display(), "seeded local spreadsheet");
                find_spreadsheet(&self.db_path, &name)
                    .map_err(storage_err)?
                    .ok_or_else(|| StoreError::NotFound(name.clone()))?
            }
            (None, None) => return Err(StoreError::NotFound(name)),
        };

        Ok(Box::new(LocalSpreadsheet {
            db_path: self.db_path.clone(),
            id,
            name,
        }))
    }
}

pub struct LocalSpreadsheet {
    db_path: PathBuf,
    id: i64,
    name: String,
}

impl Spreadsheet for LocalSpreadsheet {
    fn title(&self) -> String {
        self.name.clone()
    }

    fn worksheet(&self, name: &str) -> Result<Arc<dyn Worksheet>, StoreError> {
        let Some(worksheet_id) = find_worksheet(&self.db_path, self.id, name).map_err(storage_err)?
        else {
            let known = list_worksheet_titles(&self.db_path, self.id)
                .map_err(storage_err)?
                .join(", ");
            return Err(StoreError::NotFound(format!(
                "{name}（現有工作表：{known}）"
            )));
        };

        Ok(Arc::new(LocalWorksheet {
            db_path: self.db_path.clone(),
            id: worksheet_id,
            title: name.to_string(),
        }))
    }
}

pub struct LocalWorksheet {
    db_path: PathBuf,
    id: i64,
    title: String,
}

impl Worksheet for LocalWorksheet {
    fn title(&self) -> String {
        self.title.clone()
    }

    fn get_all_records(&self) -> Result<Vec<RowMap>, StoreError> {
        let grid = load_grid(&self.db_path, self.id).map_err(storage_err)?;
        records_from_grid(&grid)
    }

    fn append_row(&self, values: &[CellValue]) -> Result<(), StoreError> {
        let values = values.iter().map(CellValue::to_string).collect::<Vec<_>>();
        append_row(&self.db_path, self.id, &values).map_err(storage_err)?;
        Ok(())
    }

    fn update_cell(&self, row: RowIndex, col: u32, value: CellValue) -> Result<(), StoreError> {
        if row.0 == 0 || col == 0 {
            return Err(StoreError::RowOutOfRange(row.0));
        }
        update_cell(&self.db_path, self.id, row.0, col, &value.to_string()).map_err(storage_err)
    }

    fn delete_rows(&self, row: RowIndex) -> Result<(), StoreError> {
        if delete_row(&self.db_path, self.id, row.0).map_err(storage_err)? {
            Ok(())
        } else {
            Err(StoreError::RowOutOfRange(row.0))
        }
    }
}
