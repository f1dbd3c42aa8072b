use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};

use crate::config::{
    filled_output_path, TARGET_FIELDS, TARGET_IDENTIFIER_COLUMN, TARGET_START_ROW,
    USED_ROWS_FALLBACK,
};
use crate::domain::entities::record::{Record, Store};
use crate::domain::entities::target_field::TargetField;
use crate::domain::error::ReconcileError;
use crate::domain::normalize::normalize;
use crate::infra::sheet::xlsx::WorkbookSheet;
use crate::usecase::ports::sheet::{SheetError, TargetSheet};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FillSummary {
    pub updates: usize,
    pub rows_scanned: usize,
    pub rows_matched: usize,
    pub cell_failures: usize,
    pub output_path: Option<PathBuf>,
}

/// Value of the first record field, in insertion order, whose header contains
/// one of the field's keywords. An empty value still ends the search.
pub fn resolve_field<'a>(record: &'a Record, field: &TargetField) -> Option<&'a str> {
    record
        .iter()
        .find(|(header, _)| field.matches_header(header))
        .map(|(_, value)| value)
}

fn cell_access(row: u32, column: u32, err: SheetError) -> ReconcileError {
    ReconcileError::CellAccess {
        row,
        column,
        message: err.to_string(),
    }
}

/// Writes resolved record values into every target row whose identifier is
/// known to the store. Cells are only ever written, never cleared; a cell
/// that cannot be read or written is skipped.
pub fn fill(
    sheet: &mut dyn TargetSheet,
    store: &Store,
    fields: &[TargetField],
    start_row: u32,
    identifier_column: u32,
) -> FillSummary {
    let mut summary = FillSummary::default();
    let last_row = match sheet.used_rows() {
        Ok(rows) => rows,
        Err(err) => {
            log::warn!("used range unavailable ({err}), scanning up to row {USED_ROWS_FALLBACK}");
            USED_ROWS_FALLBACK
        }
    };
    log::info!("scanning rows {start_row}..={last_row}");

    for row in start_row..=last_row {
        summary.rows_scanned += 1;
        let identifier = match sheet.cell(row, identifier_column) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("{}", cell_access(row, identifier_column, err));
                summary.cell_failures += 1;
                continue;
            }
        };

        let key = normalize(&identifier);
        let Some(record) = store.get(&key) else {
            continue;
        };
        summary.rows_matched += 1;

        for field in fields {
            let Some(value) = resolve_field(record, field).filter(|v| !v.is_empty()) else {
                continue;
            };
            match sheet.set_cell(row, field.column, value) {
                Ok(()) => summary.updates += 1,
                Err(err) => {
                    log::warn!("{} ({})", cell_access(row, field.column, err), field.name);
                    summary.cell_failures += 1;
                }
            }
        }
    }

    log::info!(
        "finished: {} updates in {} matched rows",
        summary.updates,
        summary.rows_matched
    );
    summary
}

#[derive(Debug, Clone)]
pub struct FillService {
    pub fields: &'static [TargetField],
    pub start_row: u32,
    pub identifier_column: u32,
}

impl Default for FillService {
    fn default() -> Self {
        Self {
            fields: TARGET_FIELDS,
            start_row: TARGET_START_ROW,
            identifier_column: TARGET_IDENTIFIER_COLUMN,
        }
    }
}

impl FillService {
    pub fn fill_sheet(&self, sheet: &mut dyn TargetSheet, store: &Store) -> FillSummary {
        fill(
            sheet,
            store,
            self.fields,
            self.start_row,
            self.identifier_column,
        )
    }

    /// Fills `sheet`, then saves it as `<stem>_Filled.xlsx` next to
    /// `target_path` when anything was written. The sheet is closed in every
    /// case; with no updates nothing is saved.
    pub fn fill_and_save(
        &self,
        sheet: &mut dyn TargetSheet,
        target_path: &Path,
        store: &Store,
    ) -> Result<FillSummary> {
        let mut summary = self.fill_sheet(sheet, store);
        if summary.updates == 0 {
            log::info!("no matches found, closing without saving");
            sheet.close();
            return Ok(summary);
        }

        let output_path = filled_output_path(target_path);
        if output_path.exists() {
            if let Err(err) = std::fs::remove_file(&output_path) {
                log::warn!("failed to remove {}: {err}", output_path.display());
            }
        }

        let saved = sheet.save_as(&output_path);
        sheet.close();
        saved.map_err(|err| anyhow!("failed to save {}: {err}", output_path.display()))?;

        log::info!("saved to {}", output_path.display());
        summary.output_path = Some(output_path);
        Ok(summary)
    }

    pub fn fill_file(&self, target_path: &Path, store: &Store) -> Result<FillSummary> {
        log::info!("opening {}", target_path.display());
        let mut sheet = WorkbookSheet::open(target_path)?;
        self.fill_and_save(&mut sheet, target_path, store)
    }
}
