pub mod gsheets;
pub mod import;
pub mod sqlite;

use std::path::Path;

use crate::config::{Backend, BoardConfig};
use crate::infra::gsheets::client::{GoogleConnector, ServiceAccount};
use crate::infra::sqlite::workbook::{LocalConnector, Seed};
use crate::usecase::ports::store::{Connector, StoreError};
use crate::usecase::services::connection::SetupError;

/// Builds the connector the configuration asks for. `default_local_path` is used when the
/// local backend has no explicit path.
pub fn connector_for(
    config: &BoardConfig,
    default_local_path: &Path,
) -> Result<Box<dyn Connector>, SetupError> {
    match config.backend {
        Backend::Google => {
            let identity = if config.google.client_email.is_empty() {
                "(未設定 client_email)".to_string()
            } else {
                config.google.client_email.clone()
            };
            let setup_err = |source: StoreError| SetupError {
                identity: identity.clone(),
                target: config.sheet.clone(),
                source,
            };

            let access_token = std::env::var(&config.google.token_env)
                .ok()
                .filter(|token| !token.trim().is_empty())
                .ok_or_else(|| {
                    setup_err(StoreError::PermissionDenied(format!(
                        "環境變數 {} 未提供存取權杖",
                        config.google.token_env
                    )))
                })?;
            let account = ServiceAccount {
                client_email: identity.clone(),
                access_token: access_token.trim().to_string(),
            };
            let connector = GoogleConnector::new(account, config.timeout()).map_err(setup_err)?;
            Ok(Box::new(connector))
        }
        Backend::Local => {
            let db_path = config
                .local
                .path
                .clone()
                .unwrap_or_else(|| default_local_path.to_path_buf());
            let seed = config.local.seed.clone().map(|path| Seed {
                path,
                worksheet: config.worksheet.clone(),
            });
            Ok(Box::new(LocalConnector { db_path, seed }))
        }
    }
}
