use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{ExcelDateTime, Format, Formula, Workbook, Worksheet};

use crate::domain::entities::grid::{CellValue, Grid};
use crate::infra::import::xlsx::range_to_grid;
use crate::usecase::ports::sheet::{SheetError, TargetSheet};

const MAX_ROWS: u32 = 1_048_576;
const MAX_COLUMNS: u32 = 16_384;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Cached values and formulas of one worksheet, addressed from (1, 1).
#[derive(Debug, Clone, Default)]
struct SheetContents {
    name: String,
    cells: BTreeMap<(u32, u32), CellValue>,
    formulas: BTreeMap<(u32, u32), String>,
}

impl SheetContents {
    fn from_grid(name: impl Into<String>, grid: &Grid) -> Self {
        let mut cells = BTreeMap::new();
        for (row_idx, row) in grid.rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                if value.is_missing() {
                    continue;
                }
                cells.insert((row_idx as u32 + 1, col_idx as u32 + 1), value.clone());
            }
        }
        Self {
            name: name.into(),
            cells,
            formulas: BTreeMap::new(),
        }
    }

    fn write_to(&self, worksheet: &mut Worksheet) -> Result<()> {
        worksheet
            .set_name(&self.name)
            .with_context(|| format!("invalid sheet name: {}", self.name))?;

        let date_format = Format::new().set_num_format(DATE_FORMAT);
        let datetime_format = Format::new().set_num_format(DATETIME_FORMAT);

        for (&(row, column), value) in &self.cells {
            if self.formulas.contains_key(&(row, column)) {
                continue;
            }
            let (row, col) = (row - 1, (column - 1) as u16);
            let written = match value {
                CellValue::Empty => continue,
                CellValue::Text(v) => worksheet.write_string(row, col, v),
                CellValue::Number(v) => worksheet.write_number(row, col, *v),
                CellValue::Int(v) => worksheet.write_number(row, col, *v as f64),
                CellValue::Bool(v) => worksheet.write_boolean(row, col, *v),
                CellValue::DateTime(v) => match ExcelDateTime::from_serial_datetime(*v) {
                    Ok(datetime) => {
                        let format = if v.fract() == 0.0 {
                            &date_format
                        } else {
                            &datetime_format
                        };
                        worksheet.write_datetime_with_format(row, col, &datetime, format)
                    }
                    Err(_) => worksheet.write_number(row, col, *v),
                },
            };
            written.with_context(|| format!("failed to write cell ({}, {column})", row + 1))?;
        }

        for (&(row, column), formula) in &self.formulas {
            let mut cell = Formula::new(formula);
            if let Some(cached) = self.cells.get(&(row, column)) {
                cell = cell.set_result(cached_result(cached));
            }
            worksheet
                .write_formula(row - 1, (column - 1) as u16, cell)
                .with_context(|| format!("failed to write formula ({row}, {column})"))?;
        }
        Ok(())
    }
}

fn cached_result(value: &CellValue) -> String {
    match value {
        CellValue::Bool(true) => "TRUE".to_string(),
        CellValue::Bool(false) => "FALSE".to_string(),
        CellValue::DateTime(v) => v.to_string(),
        other => other.to_text(),
    }
}

/// Values written through [`TargetSheet::set_cell`] become numbers when they
/// read as one, the way Excel converts typed input.
fn typed_value(value: &str) -> CellValue {
    match value.trim().parse::<f64>() {
        Ok(number) if number.is_finite() => CellValue::Number(number),
        _ => CellValue::Text(value.to_string()),
    }
}

/// Workbook held in memory while its first worksheet is being filled. Every
/// sheet keeps its values and formulas when saved; cell formatting other than
/// dates is not carried over.
#[derive(Debug, Clone)]
pub struct WorkbookSheet {
    target: SheetContents,
    others: Vec<SheetContents>,
    closed: bool,
}

impl WorkbookSheet {
    pub fn open(path: &Path) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)
            .with_context(|| format!("failed to open workbook: {}", path.display()))?;

        let mut sheets = Vec::new();
        for name in workbook.sheet_names() {
            let range = workbook
                .worksheet_range(&name)
                .with_context(|| format!("failed to read sheet: {name}"))?;
            let mut contents = SheetContents::from_grid(name.clone(), &range_to_grid(&range));

            // Not every format exposes formulas.
            if let Ok(formulas) = workbook.worksheet_formula(&name) {
                let (start_row, start_col) = formulas.start().unwrap_or((0, 0));
                for (row, col, formula) in formulas.cells() {
                    if formula.trim().is_empty() {
                        continue;
                    }
                    let at = (start_row + row as u32 + 1, start_col + col as u32 + 1);
                    contents.formulas.insert(at, formula.clone());
                }
            }
            sheets.push(contents);
        }

        let mut sheets = sheets.into_iter();
        let target = sheets
            .next()
            .with_context(|| format!("workbook has no sheets: {}", path.display()))?;
        log::debug!(
            "opened sheet {} with {} further sheets",
            target.name,
            sheets.len()
        );
        Ok(Self {
            target,
            others: sheets.collect(),
            closed: false,
        })
    }

    /// `grid` is zero-based; the sheet addresses cells from (1, 1).
    pub fn from_grid(sheet_name: impl Into<String>, grid: &Grid) -> Self {
        Self {
            target: SheetContents::from_grid(sheet_name, grid),
            others: Vec::new(),
            closed: false,
        }
    }

    #[cfg(test)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn check(&self, row: u32, column: u32) -> Result<(), SheetError> {
        if self.closed {
            return Err(SheetError::Message("sheet is closed".to_string()));
        }
        if row == 0 || column == 0 || row > MAX_ROWS || column > MAX_COLUMNS {
            return Err(SheetError::OutOfRange { row, column });
        }
        Ok(())
    }

    fn write_workbook(&self, path: &Path) -> Result<()> {
        let mut workbook = Workbook::new();
        for sheet in std::iter::once(&self.target).chain(&self.others) {
            sheet.write_to(workbook.add_worksheet())?;
        }

        workbook
            .save(path)
            .with_context(|| format!("failed to save workbook: {}", path.display()))?;
        Ok(())
    }
}

impl TargetSheet for WorkbookSheet {
    fn used_rows(&self) -> Result<u32, SheetError> {
        if self.closed {
            return Err(SheetError::Message("sheet is closed".to_string()));
        }
        let last_value = self.target.cells.keys().map(|&(row, _)| row).max();
        let last_formula = self.target.formulas.keys().map(|&(row, _)| row).max();
        Ok(last_value.max(last_formula).unwrap_or(0))
    }

    fn cell(&self, row: u32, column: u32) -> Result<CellValue, SheetError> {
        self.check(row, column)?;
        Ok(self
            .target
            .cells
            .get(&(row, column))
            .cloned()
            .unwrap_or_default())
    }

    fn set_cell(&mut self, row: u32, column: u32, value: &str) -> Result<(), SheetError> {
        self.check(row, column)?;
        self.target.formulas.remove(&(row, column));
        self.target.cells.insert((row, column), typed_value(value));
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> Result<(), SheetError> {
        if self.closed {
            return Err(SheetError::Message("sheet is closed".to_string()));
        }
        self.write_workbook(path)
            .map_err(|err| SheetError::Message(format!("{err:#}")))
    }

    fn close(&mut self) {
        self.closed = true;
    }
}
