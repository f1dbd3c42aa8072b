use crate::config::{HEADER_SCAN_ROWS, IDENTIFIER_COLUMN_MARKERS, IDENTIFIER_ROW_MARKER};
use crate::domain::entities::grid::Grid;
use crate::domain::error::ReconcileError;
use crate::domain::normalize::normalize;

/// Zero-based position of the header row and the identifier column in a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLocation {
    pub header_row: usize,
    pub identifier_column: usize,
}

pub trait HeaderDetector {
    fn detect(&self, grid: &Grid) -> Result<HeaderLocation, ReconcileError>;
}

/// Finds the first row, within a window at the top of the grid, that names
/// the identifier column.
#[derive(Debug, Clone)]
pub struct KeywordHeaderDetector {
    pub scan_rows: usize,
    pub row_marker: &'static str,
    pub column_markers: &'static [&'static str],
}

impl Default for KeywordHeaderDetector {
    fn default() -> Self {
        Self {
            scan_rows: HEADER_SCAN_ROWS,
            row_marker: IDENTIFIER_ROW_MARKER,
            column_markers: IDENTIFIER_COLUMN_MARKERS,
        }
    }
}

impl HeaderDetector for KeywordHeaderDetector {
    fn detect(&self, grid: &Grid) -> Result<HeaderLocation, ReconcileError> {
        let window = grid.rows.iter().take(self.scan_rows).enumerate();
        for (row_idx, row) in window {
            let names: Vec<String> = row.iter().map(normalize).collect();
            if !names.iter().any(|name| name.contains(self.row_marker)) {
                continue;
            }

            // A row only qualifies when it also yields the identifier column.
            let column = names.iter().position(|name| {
                self.column_markers
                    .iter()
                    .any(|marker| name.contains(marker))
            });
            if let Some(identifier_column) = column {
                return Ok(HeaderLocation {
                    header_row: row_idx,
                    identifier_column,
                });
            }
        }

        Err(ReconcileError::HeaderNotFound {
            scanned_rows: grid.row_count().min(self.scan_rows),
        })
    }
}

/// Header position supplied by the caller, for sources with a known layout.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedHeaderDetector {
    pub location: HeaderLocation,
}

#[cfg(test)]
impl HeaderDetector for FixedHeaderDetector {
    fn detect(&self, grid: &Grid) -> Result<HeaderLocation, ReconcileError> {
        if self.location.header_row >= grid.row_count() {
            return Err(ReconcileError::HeaderNotFound {
                scanned_rows: grid.row_count(),
            });
        }
        Ok(self.location)
    }
}
