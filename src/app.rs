use std::sync::Arc;

use dioxus::prelude::*;
use rfd::{MessageButtons, MessageDialog, MessageLevel};
use tracing::error;

use crate::config::BoardConfig;
use crate::default_config_path;
use crate::default_workbook_path;
use crate::domain::entities::form::RecordDraft;
use crate::domain::entities::record::Snapshot;
use crate::infra::connector_for;
use crate::platform::desktop::blocking::run_blocking;
use crate::ui::state::app_state::{AppState, Phase};
use crate::ui::view::{
    columns_style, notice_style, prefill, resolve_selection, root_container_style, table_cell_style,
    table_container_style, table_header_cell_style, table_view, Notice, NoticeLevel,
    EMPTY_SHEET_MESSAGE, PAGE_TITLE,
};
use crate::usecase::services::board_service::{BoardError, RecordBoard};
use crate::usecase::services::connection::{shared, ConnectionCache};

/// Loads the configuration and opens the worksheet through the process-wide cache.
pub fn open_board() -> Result<RecordBoard, String> {
    let config_path = default_config_path().map_err(|err| format!("無法取得設定檔路徑：{err}"))?;
    let config = BoardConfig::load(&config_path).map_err(|err| err.to_string())?;
    let workbook_path =
        default_workbook_path().map_err(|err| format!("無法取得本機資料庫路徑：{err}"))?;

    let cache = shared(|| {
        let connector = connector_for(&config, &workbook_path)?;
        Ok(ConnectionCache::new(
            connector,
            config.target(),
            config.worksheet.clone(),
        ))
    })
    .map_err(|err| err.to_string())?;
    let worksheet = cache.worksheet().map_err(|err| err.to_string())?;

    Ok(RecordBoard::new(
        worksheet,
        config.columns(),
        config.row_check(),
    ))
}

fn show_fatal_dialog(message: &str) {
    MessageDialog::new()
        .set_level(MessageLevel::Error)
        .set_title("無法開啟試算表")
        .set_description(message)
        .set_buttons(MessageButtons::Ok)
        .show();
}

/// Replaces the snapshot with a fresh read, or reports why it could not be read.
fn reload(
    board: &RecordBoard,
    mut snapshot: Signal<Option<Snapshot>>,
    mut error_banner: Signal<Option<String>>,
) {
    match run_blocking("list", || board.list()) {
        Ok(loaded) => snapshot.set(Some(loaded)),
        Err(err) => {
            error!(%err, "reload failed");
            error_banner.set(Some(format!("讀取資料失敗：{err}")));
        }
    }
}

/// Ends a Mutating phase. Successful calls already carry the fresh snapshot;
/// failed ones fall back to a plain reload since a write may have partially landed.
fn finish_mutation(
    board: &RecordBoard,
    result: Result<Snapshot, BoardError>,
    success_message: &str,
    state: &AppState,
) {
    let AppState {
        mut snapshot,
        mut phase,
        mut notice,
        mut error_banner,
        ..
    } = *state;

    match result {
        Ok(loaded) => {
            snapshot.set(Some(loaded));
            error_banner.set(None);
            notice.set(Some(Notice::success(success_message)));
        }
        Err(err) => {
            error!(%err, "mutation failed");
            notice.set(None);
            error_banner.set(Some(format!("發生錯誤：{err}")));
            reload(board, snapshot, error_banner);
        }
    }
    phase.set(Phase::Viewing);
}

#[component]
pub fn App() -> Element {
    let state = AppState::new();
    let AppState {
        snapshot,
        mut phase,
        notice,
        error_banner,
        mut create_draft,
        mut create_warning,
        mut update_selected,
        mut update_draft,
        mut update_warning,
        mut delete_selected,
    } = state;

    let setup = use_hook(|| {
        let result = run_blocking("connect", open_board).map(Arc::new);
        if let Err(message) = &result {
            error!(%message, "setup failed");
            show_fatal_dialog(message);
        }
        result
    });

    let board_for_init = setup.as_ref().ok().cloned();
    use_effect(move || {
        if let Some(board) = &board_for_init {
            reload(board, snapshot, error_banner);
            phase.set(Phase::Viewing);
        }
    });

    let board_columns = setup
        .as_ref()
        .map(|board| board.columns().clone())
        .unwrap_or_default();
    let columns_for_prefill = board_columns.clone();
    use_effect(move || {
        let current = snapshot();
        let selected = update_selected();
        let Some(current) = current else {
            return;
        };
        let options = current.row_options(&columns_for_prefill.label);
        let draft = resolve_selection(&options, selected.as_deref())
            .map(|option| prefill(&current, option.row_index, &columns_for_prefill))
            .unwrap_or_default();
        update_draft.set(draft);
        update_warning.set(None);
    });

    let board = match &setup {
        Ok(board) => board.clone(),
        Err(message) => {
            return rsx! {
                div { style: "{root_container_style()}",
                    h1 { "{PAGE_TITLE}" }
                    div { style: "{notice_style(NoticeLevel::Error)}", "{message}" }
                }
            };
        }
    };

    let busy = phase() != Phase::Viewing;
    let current = snapshot();
    let options = current
        .as_ref()
        .map(|snap| snap.row_options(&board_columns.label))
        .unwrap_or_default();
    let update_option = resolve_selection(&options, update_selected().as_deref()).cloned();
    let delete_option = resolve_selection(&options, delete_selected().as_deref()).cloned();
    let update_value = update_option
        .as_ref()
        .map(|option| option.label.clone())
        .unwrap_or_default();
    let delete_value = delete_option
        .as_ref()
        .map(|option| option.label.clone())
        .unwrap_or_default();
    let fetched_at = current
        .as_ref()
        .map(|snap| snap.fetched_at().format("%H:%M:%S").to_string())
        .unwrap_or_default();

    let board_for_create = board.clone();
    let board_for_update = board.clone();
    let board_for_delete = board.clone();
    let update_row = update_option.as_ref().map(|option| option.row_index);
    let delete_row = delete_option.as_ref().map(|option| option.row_index);

    rsx! {
        div { style: "{root_container_style()}",
            h1 { "{PAGE_TITLE}" }

            if let Phase::Mutating(message) = phase() {
                div { style: "{notice_style(NoticeLevel::Info)}", "⏳ {message}" }
            }
            if let Some(message) = error_banner() {
                div { style: "{notice_style(NoticeLevel::Error)}", "{message}" }
            }
            if let Some(Notice { level, message }) = notice() {
                div { style: "{notice_style(level)}", "{message}" }
            }

            h2 { "1️⃣ 目前資料列表" }
            {match current.as_ref() {
                None => rsx! {},
                Some(snap) if snap.is_empty() => rsx! {
                    div { style: "{notice_style(NoticeLevel::Info)}", "{EMPTY_SHEET_MESSAGE}" }
                },
                Some(snap) => {
                    let view = table_view(snap);
                    rsx! {
                        div { style: "{table_container_style()}",
                            table { style: "border-collapse: collapse; width: 100%; background: #fff;",
                                thead {
                                    tr {
                                        {view.headers.iter().map(|header| rsx!(
                                            th { style: "{table_header_cell_style()}", "{header}" }
                                        ))}
                                    }
                                }
                                tbody {
                                    {view.rows.iter().map(|row| rsx!(
                                        tr {
                                            {row.iter().map(|cell| rsx!(
                                                td { style: "{table_cell_style()}", "{cell}" }
                                            ))}
                                        }
                                    ))}
                                }
                            }
                        }
                        div { style: "color: #888; font-size: 12px;", "最後讀取：{fetched_at}" }
                    }
                }
            }}

            hr {}

            h2 { "2️⃣ 新增資料" }
            div { style: "display: grid; grid-template-columns: 120px 1fr; gap: 6px; max-width: 480px;",
                label { "姓名" }
                input {
                    disabled: busy,
                    value: "{create_draft().label}",
                    oninput: move |event| create_draft.write().label = event.value(),
                }
                label { "數量" }
                input {
                    r#type: "number",
                    min: "0",
                    step: "1",
                    disabled: busy,
                    value: "{create_draft().quantity}",
                    oninput: move |event| create_draft.write().quantity = event.value(),
                }
            }
            if let Some(warning) = create_warning() {
                div { style: "{notice_style(NoticeLevel::Warning)}", "{warning}" }
            }
            button {
                disabled: busy || current.is_none(),
                onclick: move |_| {
                    // No write until a read has confirmed the column layout.
                    if phase() != Phase::Viewing || snapshot().is_none() {
                        return;
                    }
                    let draft = create_draft();
                    if let Err(err) = draft.validate() {
                        create_warning.set(Some(err.to_string()));
                        return;
                    }
                    create_warning.set(None);
                    phase.set(Phase::Mutating("正在寫入資料中..."));

                    let board = board_for_create.clone();
                    spawn(async move {
                        let result = run_blocking("create", || board.create(&draft));
                        if result.is_ok() {
                            create_draft.set(RecordDraft::default());
                        }
                        finish_mutation(&board, result, "資料已成功寫入！", &state);
                    });
                },
                "寫入 Google Sheet"
            }

            hr {}

            if current.as_ref().is_some_and(|snap| !snap.is_empty()) {
                div { style: "{columns_style()}",
                    div {
                        h2 { "3️⃣ 修改資料" }
                        label { "選擇要修改的資料 " }
                        select {
                            disabled: busy,
                            value: "{update_value}",
                            onchange: move |event| update_selected.set(Some(event.value())),
                            {options.iter().map(|entry| {
                                let label = entry.label.clone();
                                rsx!(
                                    option { value: "{label}", selected: label == update_value, "{label}" }
                                )
                            })}
                        }
                        div { style: "display: grid; grid-template-columns: 120px 1fr; gap: 6px; margin-top: 8px;",
                            label { "新姓名" }
                            input {
                                disabled: busy,
                                value: "{update_draft().label}",
                                oninput: move |event| update_draft.write().label = event.value(),
                            }
                            label { "新數量" }
                            input {
                                r#type: "number",
                                min: "0",
                                step: "1",
                                disabled: busy,
                                value: "{update_draft().quantity}",
                                oninput: move |event| update_draft.write().quantity = event.value(),
                            }
                        }
                        if let Some(warning) = update_warning() {
                            div { style: "{notice_style(NoticeLevel::Warning)}", "{warning}" }
                        }
                        button {
                            disabled: busy,
                            onclick: move |_| {
                                if phase() != Phase::Viewing {
                                    return;
                                }
                                let (Some(row), Some(snap)) = (update_row, snapshot()) else {
                                    return;
                                };
                                let draft = update_draft();
                                if let Err(err) = draft.validate() {
                                    update_warning.set(Some(err.to_string()));
                                    return;
                                }
                                update_warning.set(None);
                                phase.set(Phase::Mutating("正在更新資料中..."));

                                let board = board_for_update.clone();
                                spawn(async move {
                                    let result = run_blocking("update", || board.update(&snap, row, &draft));
                                    finish_mutation(&board, result, "資料已成功更新！", &state);
                                });
                            },
                            "更新資料"
                        }
                    }

                    div {
                        h2 { "4️⃣ 刪除資料" }
                        label { "選擇要刪除的資料 " }
                        select {
                            disabled: busy,
                            value: "{delete_value}",
                            onchange: move |event| delete_selected.set(Some(event.value())),
                            {options.iter().map(|entry| {
                                let label = entry.label.clone();
                                rsx!(
                                    option { value: "{label}", selected: label == delete_value, "{label}" }
                                )
                            })}
                        }
                        p { "⚠️ 即將刪除：" strong { "{delete_value}" } }
                        button {
                            disabled: busy,
                            style: "background: #d33; color: #fff; border: none; padding: 6px 12px; border-radius: 6px;",
                            onclick: move |_| {
                                if phase() != Phase::Viewing {
                                    return;
                                }
                                let (Some(row), Some(snap)) = (delete_row, snapshot()) else {
                                    return;
                                };
                                phase.set(Phase::Mutating("正在刪除資料中..."));

                                let board = board_for_delete.clone();
                                spawn(async move {
                                    let result = run_blocking("delete", || board.delete(&snap, row));
                                    finish_mutation(&board, result, "資料已成功刪除！", &state);
                                });
                            },
                            "🗑️ 確認刪除這筆資料"
                        }
                    }
                }
            }
        }
    }
}
