use crate::domain::entities::grid::Grid;
use crate::domain::entities::record::Store;
use crate::domain::error::ReconcileError;
use crate::domain::header::{HeaderDetector, HeaderLocation};
use crate::domain::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub location: HeaderLocation,
    /// Rows below the header with a usable identifier, new or already known.
    pub rows_imported: usize,
}

/// Merges every identified row of `grid` into `store`.
///
/// Existing fields are only replaced by non-missing cells of the same
/// normalized header; nothing is ever removed. The store is left untouched
/// when no header is detected.
pub fn ingest(
    grid: &Grid,
    store: &mut Store,
    detector: &dyn HeaderDetector,
) -> Result<IngestOutcome, ReconcileError> {
    let location = detector.detect(grid)?;
    let column_names: Vec<String> = grid
        .rows
        .get(location.header_row)
        .map(|header| header.iter().map(normalize).collect())
        .unwrap_or_default();

    let mut rows_imported = 0_usize;
    for row in grid.rows.iter().skip(location.header_row + 1) {
        let key = row
            .get(location.identifier_column)
            .map(normalize)
            .unwrap_or_default();
        let Some(record) = store.record_mut(&key) else {
            continue;
        };

        for (col_idx, value) in row.iter().enumerate() {
            if value.is_missing() {
                continue;
            }
            let header_name = column_names
                .get(col_idx)
                .cloned()
                .unwrap_or_else(|| format!("COL_{col_idx}"));
            record.set(header_name, value.to_text().trim());
        }
        rows_imported += 1;
    }

    Ok(IngestOutcome {
        location,
        rows_imported,
    })
}
