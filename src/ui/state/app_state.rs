use chrono::Local;
use dioxus::prelude::*;

use crate::domain::entities::record::Store;

pub struct AppState {
    pub store: Signal<Store>,
    pub busy: Signal<bool>,
    pub log_lines: Signal<Vec<String>>,
}

impl AppState {
    pub fn new(load_store: impl FnOnce() -> Store) -> Self {
        Self {
            store: use_signal(load_store),
            busy: use_signal(|| false),
            log_lines: use_signal(|| vec![stamped("Ready.")]),
        }
    }

    pub fn record_count(&self) -> usize {
        self.store.read().len()
    }
}

fn stamped(message: &str) -> String {
    format!("[{}] {message}", Local::now().format("%H:%M:%S"))
}

pub fn push_log(mut log_lines: Signal<Vec<String>>, message: impl AsRef<str>) {
    log_lines.write().push(stamped(message.as_ref()));
}
