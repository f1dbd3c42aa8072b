use std::path::Path;
use std::sync::Arc;

use dioxus::prelude::*;
use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::config::default_store_path;
use crate::infra::json::repo::JsonStoreRepo;
use crate::ui::state::app_state::{push_log, AppState};
use crate::usecase::services::fill_service::FillService;
use crate::usecase::services::import_service::ImportService;

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn show_message(level: MessageLevel, title: &str, description: String) {
    MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(MessageButtons::Ok)
        .show();
}

#[component]
pub fn App() -> Element {
    let store_path = default_store_path();
    let import_service = store_path
        .as_ref()
        .ok()
        .map(|path| Arc::new(ImportService::new(Arc::new(JsonStoreRepo::new(path.clone())))));
    let fill_service = Arc::new(FillService::default());

    let import_service_for_init = import_service.clone();
    let state = AppState::new(move || {
        import_service_for_init
            .map(|service| service.load_store())
            .unwrap_or_default()
    });
    let record_count = state.record_count();
    let AppState {
        mut store,
        mut busy,
        log_lines,
    } = state;

    let Some(import_service) = import_service else {
        let reason = store_path.err().map(|err| err.to_string()).unwrap_or_default();
        return rsx! {
            div {
                p { "Unable to resolve the store location: {reason}" }
            }
        };
    };

    let import_service_for_import = import_service.clone();
    let fill_service_for_fill = fill_service.clone();

    rsx! {
        div {
            style: "display: flex; flex-direction: column; gap: 16px; padding: 20px; font-family: sans-serif;",
            fieldset {
                legend { "Step 1: Import Source" }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        if busy() {
                            return;
                        }

                        let Some(file_path) = FileDialog::new()
                            .add_filter("Master data", &["csv", "xlsx", "xls", "ods"])
                            .pick_file() else {
                            push_log(log_lines, "Import cancelled.");
                            return;
                        };

                        *busy.write() = true;
                        push_log(log_lines, format!("Reading {}...", file_label(&file_path)));

                        match import_service_for_import.import_file(&file_path, &mut store.write()) {
                            Ok(summary) => {
                                push_log(
                                    log_lines,
                                    format!("Success! Imported {} records.", summary.rows_imported),
                                );
                                if !summary.saved {
                                    push_log(
                                        log_lines,
                                        "Warning: the store could not be saved, changes only last for this session.",
                                    );
                                }
                            }
                            Err(err) => {
                                push_log(log_lines, format!("Error: {err:#}"));
                                show_message(MessageLevel::Error, "Error", err.to_string());
                            }
                        }
                        *busy.write() = false;
                    },
                    "Import Master Data"
                }
                p { "Records: {record_count}" }
            }
            fieldset {
                legend { "Step 2: Fill Target" }
                button {
                    disabled: busy(),
                    onclick: move |_| {
                        if busy() {
                            return;
                        }

                        let Some(target_path) = FileDialog::new()
                            .add_filter("Excel", &["xlsx"])
                            .pick_file() else {
                            push_log(log_lines, "Fill cancelled.");
                            return;
                        };

                        *busy.write() = true;
                        push_log(log_lines, format!("Opening {}...", file_label(&target_path)));

                        match fill_service_for_fill.fill_file(&target_path, &store.read()) {
                            Ok(summary) => {
                                push_log(
                                    log_lines,
                                    format!("Finished. Total updates: {}", summary.updates),
                                );
                                if summary.cell_failures > 0 {
                                    push_log(
                                        log_lines,
                                        format!("Skipped {} cells that could not be accessed.", summary.cell_failures),
                                    );
                                }
                                match &summary.output_path {
                                    Some(output_path) => {
                                        push_log(log_lines, format!("Saved to: {}", output_path.display()));
                                        show_message(
                                            MessageLevel::Info,
                                            "Success",
                                            format!("Updated {} fields!\nFile saved.", summary.updates),
                                        );
                                    }
                                    None => {
                                        push_log(log_lines, "No matches found.");
                                        show_message(
                                            MessageLevel::Warning,
                                            "Result",
                                            "No updates made.".to_string(),
                                        );
                                    }
                                }
                            }
                            Err(err) => {
                                push_log(log_lines, format!("Excel Error: {err:#}"));
                                show_message(MessageLevel::Error, "Excel Error", err.to_string());
                            }
                        }
                        *busy.write() = false;
                    },
                    "Select Target File & Run"
                }
            }
            div {
                style: "border: 1px solid #ccc; padding: 8px; height: 280px; overflow-y: auto; font-family: monospace;",
                for line in log_lines() {
                    div { "{line}" }
                }
            }
        }
    }
}
