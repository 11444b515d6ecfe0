mod app;
mod config;
mod domain;
mod infra;
mod platform;
mod ui;
mod usecase;


use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use tracing::error;

use crate::app::App;
use crate::ui::view::PAGE_TITLE;

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "hellhbbd", "sheetboard")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(config::CONFIG_FILE_NAME))
}

pub fn default_workbook_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join("workbook.sqlite"))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut desktop_config = dioxus::desktop::Config::new()
        .with_window(dioxus::desktop::WindowBuilder::new().with_title(PAGE_TITLE));
    match default_webview_data_dir() {
        Ok(dir) => desktop_config = desktop_config.with_data_directory(dir),
        Err(err) => error!(?err, "falling back to default webview data directory"),
    }

    dioxus::LaunchBuilder::desktop()
        .with_cfg(desktop_config)
        .launch(App);
}
