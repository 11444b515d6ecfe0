//! Startup configuration for the board.
//!
//! Read once from `sheetboard.toml` in the platform config directory. When the file is absent
//! the built-in defaults below are used.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::domain::entities::target::SheetTarget;
use crate::usecase::services::board_service::{BoardColumns, RowCheck};

pub const CONFIG_FILE_NAME: &str = "sheetboard.toml";
pub const DEFAULT_SHEET: &str =
    "https://docs.google.com/spreadsheets/d/1scyPr63TYfvHrHGECVVn1krCnur2z0rrwR1OijCzfdY/edit?gid=0#gid=0";
pub const DEFAULT_WORKSHEET: &str = "工作表1";
pub const DEFAULT_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Google,
    Local,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct BoardConfig {
    pub sheet: String,
    pub worksheet: String,
    pub backend: Backend,
    pub label_column: String,
    pub quantity_column: String,
    pub verify_row_before_write: bool,
    pub google: GoogleConfig,
    pub local: LocalConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct GoogleConfig {
    pub client_email: String,
    pub token_env: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct LocalConfig {
    pub path: Option<PathBuf>,
    pub seed: Option<PathBuf>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        let columns = BoardColumns::default();
        Self {
            sheet: DEFAULT_SHEET.to_string(),
            worksheet: DEFAULT_WORKSHEET.to_string(),
            backend: Backend::default(),
            label_column: columns.label,
            quantity_column: columns.quantity,
            verify_row_before_write: false,
            google: GoogleConfig::default(),
            local: LocalConfig::default(),
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            client_email: String::new(),
            token_env: DEFAULT_TOKEN_ENV.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("無法讀取設定檔 {path}：{source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("設定檔格式錯誤：{0}")]
    Parse(#[from] toml::de::Error),
    #[error("設定值 {field} 無效：{reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl BoardConfig {
    /// Loads `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config: BoardConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("sheet", &self.sheet),
            ("worksheet", &self.worksheet),
            ("label_column", &self.label_column),
            ("quantity_column", &self.quantity_column),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: "不可為空".to_string(),
                });
            }
        }
        if self.google.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "google.timeout_secs",
                reason: "必須大於 0".to_string(),
            });
        }
        Ok(())
    }

    pub fn target(&self) -> SheetTarget {
        SheetTarget::parse(&self.sheet)
    }

    pub fn columns(&self) -> BoardColumns {
        BoardColumns {
            label: self.label_column.clone(),
            quantity: self.quantity_column.clone(),
        }
    }

    pub fn row_check(&self) -> RowCheck {
        if self.verify_row_before_write {
            RowCheck::Verify
        } else {
            RowCheck::Trust
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.google.timeout_secs)
    }
}
