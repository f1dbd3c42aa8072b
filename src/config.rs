use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;

use crate::domain::entities::target_field::TargetField;

pub const STORE_FILE_NAME: &str = "shipping_database.json";
pub const STORE_PATH_ENV: &str = "SHIPFILL_STORE";

pub const HEADER_SCAN_ROWS: usize = 30;
pub const IDENTIFIER_ROW_MARKER: &str = "CONTAINER";
pub const IDENTIFIER_COLUMN_MARKERS: &[&str] = &["CONTAINER", "CNTR"];

pub const TARGET_START_ROW: u32 = 9;
pub const TARGET_IDENTIFIER_COLUMN: u32 = 3;
pub const USED_ROWS_FALLBACK: u32 = 1000;
pub const FILLED_SUFFIX: &str = "_Filled";

pub const TARGET_FIELDS: &[TargetField] = &[
    TargetField {
        name: "Seal",
        column: 6,
        keywords: &["SEAL"],
    },
    TargetField {
        name: "PKG",
        column: 11,
        keywords: &["PKG", "PACKAGE", "QTY", "QUANTITY"],
    },
    TargetField {
        name: "Weight",
        column: 12,
        keywords: &["WEIGHT", "KGS", "GW", "GROSS"],
    },
    TargetField {
        name: "Description",
        column: 13,
        keywords: &["DESCRIPTION", "COMMODITY", "GOODS", "DESC"],
    },
    TargetField {
        name: "Broker",
        column: 20,
        keywords: &["BROKER", "AGENT"],
    },
    TargetField {
        name: "VGM",
        column: 21,
        keywords: &["VGM", "VERIFIED"],
    },
];

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "hellhbbd", "shipfill")
        .ok_or_else(|| anyhow!("unable to resolve data directory"))
}

pub fn default_store_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(STORE_PATH_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    Ok(project_dirs()?.data_local_dir().join(STORE_FILE_NAME))
}

fn ensure_webview_data_dir(base_data_dir: &Path) -> Result<PathBuf> {
    let webview_data_dir = base_data_dir.join("webview2");
    std::fs::create_dir_all(&webview_data_dir).with_context(|| {
        format!(
            "failed to create webview data dir: {}",
            webview_data_dir.display()
        )
    })?;
    Ok(webview_data_dir)
}

pub fn default_webview_data_dir() -> Result<PathBuf> {
    ensure_webview_data_dir(project_dirs()?.data_local_dir())
}

/// `<dir>/<stem>_Filled.xlsx` next to the target workbook.
pub fn filled_output_path(target_path: &Path) -> PathBuf {
    let stem = target_path
        .file_stem()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("target");
    target_path.with_file_name(format!("{stem}{FILLED_SUFFIX}.xlsx"))
}
