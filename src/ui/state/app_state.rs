use dioxus::prelude::{use_signal, Signal};

use crate::domain::entities::form::RecordDraft;
use crate::domain::entities::record::Snapshot;
use crate::ui::view::Notice;

/// Viewing renders the snapshot; Mutating blocks every control until the reload lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Viewing,
    Mutating(&'static str),
}

#[derive(Clone, Copy)]
pub struct AppState {
    pub snapshot: Signal<Option<Snapshot>>,
    pub phase: Signal<Phase>,
    pub notice: Signal<Option<Notice>>,
    pub error_banner: Signal<Option<String>>,
    pub create_draft: Signal<RecordDraft>,
    pub create_warning: Signal<Option<String>>,
    pub update_selected: Signal<Option<String>>,
    pub update_draft: Signal<RecordDraft>,
    pub update_warning: Signal<Option<String>>,
    pub delete_selected: Signal<Option<String>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            snapshot: use_signal(|| None::<Snapshot>),
            phase: use_signal(|| Phase::Mutating("正在讀取資料中...")),
            notice: use_signal(|| None::<Notice>),
            error_banner: use_signal(|| None::<String>),
            create_draft: use_signal(RecordDraft::default),
            create_warning: use_signal(|| None::<String>),
            update_selected: use_signal(|| None::<String>),
            update_draft: use_signal(RecordDraft::default),
            update_warning: use_signal(|| None::<String>),
            delete_selected: use_signal(|| None::<String>),
        }
    }
}
