use std::path::Path;

use anyhow::{Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};

use crate::domain::entities::grid::{CellValue, Grid};

pub fn cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::String(v) => CellValue::Text(v.to_string()),
        Data::Float(v) => CellValue::Number(*v),
        Data::Int(v) => CellValue::Int(*v),
        Data::Bool(v) => CellValue::Bool(*v),
        Data::DateTime(v) => CellValue::DateTime(v.as_f64()),
        Data::DateTimeIso(v) => CellValue::Text(v.to_string()),
        Data::DurationIso(v) => CellValue::Text(v.to_string()),
        Data::Error(_) | Data::Empty => CellValue::Empty,
    }
}

/// Converts a used range into a grid anchored at A1, so that grid indices are
/// absolute sheet positions even when the data starts further down or right.
pub fn range_to_grid(range: &Range<Data>) -> Grid {
    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for row in range.rows() {
        let mut cells = vec![CellValue::Empty; start_col as usize];
        cells.extend(row.iter().map(cell_to_value));
        rows.push(cells);
    }
    Grid::new(rows)
}

/// First worksheet of the workbook, together with its name.
pub fn read_first_sheet(path: &Path) -> Result<(String, Grid)> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("failed to open workbook: {}", path.display()))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .with_context(|| format!("workbook has no sheets: {}", path.display()))?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .with_context(|| format!("failed to read sheet: {sheet_name}"))?;

    Ok((sheet_name, range_to_grid(&range)))
}

pub fn read_workbook_grid(path: &Path) -> Result<Grid> {
    read_first_sheet(path).map(|(_, grid)| grid)
}
