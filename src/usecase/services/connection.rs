use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{error, info};

use crate::domain::entities::target::SheetTarget;
use crate::usecase::ports::store::{Connector, StoreError, Worksheet};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("無法開啟試算表，請確認名稱/網址是否正確，且服務帳號 ({identity}) 已被加入共用編輯者！\n錯誤訊息：{source}")]
pub struct SetupError {
    pub identity: String,
    pub target: String,
    pub source: StoreError,
}

/// Opens the configured worksheet on first use and hands out the same handle afterwards.
pub struct ConnectionCache {
    connector: Box<dyn Connector>,
    target: SheetTarget,
    worksheet_name: String,
    handle: OnceCell<Arc<dyn Worksheet>>,
}

impl ConnectionCache {
    pub fn new(
        connector: Box<dyn Connector>,
        target: SheetTarget,
        worksheet_name: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            target,
            worksheet_name: worksheet_name.into(),
            handle: OnceCell::new(),
        }
    }

    pub fn worksheet(&self) -> Result<Arc<dyn Worksheet>, SetupError> {
        self.handle
            .get_or_try_init(|| {
                let spreadsheet = self.connector.open(&self.target)?;
                let worksheet = spreadsheet.worksheet(&self.worksheet_name)?;
                info!(
                    spreadsheet = %spreadsheet.title(),
                    worksheet = %worksheet.title(),
                    "opened worksheet"
                );
                Ok::<_, StoreError>(worksheet)
            })
            .map(Arc::clone)
            .map_err(|source| {
                let err = SetupError {
                    identity: self.connector.identity(),
                    target: self.target.to_string(),
                    source,
                };
                error!(target_sheet = %err.target, identity = %err.identity, "cannot open worksheet");
                err
            })
    }
}

static SHARED: OnceCell<ConnectionCache> = OnceCell::new();

/// The process-wide cache. `init` runs at most once; later calls reuse its result.
pub fn shared<F>(init: F) -> Result<&'static ConnectionCache, SetupError>
where
    F: FnOnce() -> Result<ConnectionCache, SetupError>,
{
    SHARED.get_or_try_init(init)
}
