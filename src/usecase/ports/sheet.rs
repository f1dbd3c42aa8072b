use std::path::Path;

use crate::domain::entities::grid::CellValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetError {
    OutOfRange { row: u32, column: u32 },
    Message(String),
}

impl std::fmt::Display for SheetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetError::OutOfRange { row, column } => {
                write!(f, "cell ({row}, {column}) is outside the sheet")
            }
            SheetError::Message(message) => write!(f, "{message}"),
        }
    }
}

impl std::error::Error for SheetError {}

/// Live handle on the spreadsheet being filled. Rows and columns are 1-based.
pub trait TargetSheet {
    /// Last row that holds any data.
    fn used_rows(&self) -> Result<u32, SheetError>;
    fn cell(&self, row: u32, column: u32) -> Result<CellValue, SheetError>;
    fn set_cell(&mut self, row: u32, column: u32, value: &str) -> Result<(), SheetError>;
    fn save_as(&mut self, path: &Path) -> Result<(), SheetError>;
    /// Releases the handle without persisting anything not yet saved.
    fn close(&mut self);
}
