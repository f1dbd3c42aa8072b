use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::domain::entities::grid::Grid;
use crate::domain::entities::record::Store;
use crate::domain::error::ReconcileError;
use crate::domain::header::{HeaderDetector, KeywordHeaderDetector};
use crate::domain::ingest::ingest;
use crate::infra::import::csv::read_csv_grid;
use crate::infra::import::xlsx::read_workbook_grid;
use crate::usecase::ports::store::StoreRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub rows_imported: usize,
    pub record_count: usize,
    pub header_row: usize,
    pub identifier_column: usize,
    /// False when the store could not be written back; the in-memory store
    /// is still up to date.
    pub saved: bool,
}

pub struct ImportService {
    repo: Arc<dyn StoreRepository>,
    detector: Arc<dyn HeaderDetector>,
}

impl ImportService {
    pub fn new(repo: Arc<dyn StoreRepository>) -> Self {
        Self::with_detector(repo, Arc::new(KeywordHeaderDetector::default()))
    }

    pub fn with_detector(
        repo: Arc<dyn StoreRepository>,
        detector: Arc<dyn HeaderDetector>,
    ) -> Self {
        Self { repo, detector }
    }

    /// Loads the persisted store, starting empty when it cannot be read.
    pub fn load_store(&self) -> Store {
        match self.repo.load() {
            Ok(store) => {
                log::info!("loaded store with {} records", store.len());
                store
            }
            Err(err) => {
                let err = ReconcileError::Persistence(err.to_string());
                log::warn!("{err}, starting with an empty store");
                Store::new()
            }
        }
    }

    pub fn import_file(&self, path: &Path, store: &mut Store) -> Result<ImportSummary> {
        log::info!("reading {}", path.display());
        let grid = read_source_grid(path)?;
        Ok(self.import_grid(&grid, store)?)
    }

    pub fn import_grid(
        &self,
        grid: &Grid,
        store: &mut Store,
    ) -> Result<ImportSummary, ReconcileError> {
        let outcome = ingest(grid, store, self.detector.as_ref())?;
        log::info!(
            "header at row {}, identifier column {}; imported {} rows",
            outcome.location.header_row,
            outcome.location.identifier_column,
            outcome.rows_imported
        );

        let saved = match self.repo.save(store) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("{}", ReconcileError::Persistence(err.to_string()));
                false
            }
        };

        Ok(ImportSummary {
            rows_imported: outcome.rows_imported,
            record_count: store.len(),
            header_row: outcome.location.header_row,
            identifier_column: outcome.location.identifier_column,
            saved,
        })
    }
}

/// `.csv` files go through the CSV reader, everything else is opened as a workbook.
pub fn read_source_grid(path: &Path) -> Result<Grid> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    if ext == "csv" {
        read_csv_grid(path)
    } else {
        read_workbook_grid(path)
    }
}
