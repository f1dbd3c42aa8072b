use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use calamine::{open_workbook_auto, Reader};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook};

use crate::config::{filled_output_path, USED_ROWS_FALLBACK};
use crate::domain::entities::grid::{CellValue, Grid};
use crate::domain::entities::record::{Record, Store};
use crate::domain::error::ReconcileError;
use crate::domain::header::{FixedHeaderDetector, HeaderLocation};
use crate::infra::import::csv::read_csv_grid;
use crate::infra::import::xlsx::read_first_sheet;
use crate::infra::json::repo::JsonStoreRepo;
use crate::infra::sheet::xlsx::WorkbookSheet;
use crate::usecase::ports::sheet::{SheetError, TargetSheet};
use crate::usecase::ports::store::{RepoError, StoreRepository};
use crate::usecase::services::fill_service::FillService;
use crate::usecase::services::import_service::{read_source_grid, ImportService};

fn unique_test_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock should be after epoch")
        .as_nanos();
    std::env::temp_dir().join(format!("shipfill-{prefix}-{nanos}"))
}

#[derive(Default)]
struct MemoryRepo {
    saved: Mutex<Option<Store>>,
    fail_save: bool,
}

impl StoreRepository for MemoryRepo {
    fn load(&self) -> Result<Store, RepoError> {
        Ok(self
            .saved
            .lock()
            .expect("lock should not be poisoned")
            .clone()
            .unwrap_or_default())
    }

    fn save(&self, store: &Store) -> Result<(), RepoError> {
        if self.fail_save {
            return Err(RepoError::Message("disk full".to_string()));
        }
        *self.saved.lock().expect("lock should not be poisoned") = Some(store.clone());
        Ok(())
    }
}

/// Target sheet whose cells in `broken_column` cannot be written and whose
/// used range cannot be queried.
struct FlakySheet {
    inner: WorkbookSheet,
    broken_column: u32,
}

impl TargetSheet for FlakySheet {
    fn used_rows(&self) -> Result<u32, SheetError> {
        Err(SheetError::Message("used range unavailable".to_string()))
    }

    fn cell(&self, row: u32, column: u32) -> Result<CellValue, SheetError> {
        self.inner.cell(row, column)
    }

    fn set_cell(&mut self, row: u32, column: u32, value: &str) -> Result<(), SheetError> {
        if column == self.broken_column {
            return Err(SheetError::Message("protected cell".to_string()));
        }
        self.inner.set_cell(row, column, value)
    }

    fn save_as(&mut self, path: &Path) -> Result<(), SheetError> {
        self.inner.save_as(path)
    }

    fn close(&mut self) {
        self.inner.close();
    }
}

fn source_grid() -> Grid {
    Grid::from_text_rows(vec![
        vec!["Booking report", "", "", ""],
        vec!["", "", "", ""],
        vec!["No.", "Container", "SEAL", "PKG QTY"],
        vec!["1", "CNT001", "S99", "50"],
    ])
}

fn target_grid(identifier: &str) -> Grid {
    let mut rows = vec![vec!["Manifest"]; 8];
    rows.push(vec!["1", "", identifier]);
    Grid::from_text_rows(rows)
}

fn write_target_workbook(path: &Path, identifiers: &[&str]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Manifest").expect("valid sheet name");
    worksheet
        .write_string(0, 0, "Loading list")
        .expect("should write title");
    for (offset, identifier) in identifiers.iter().enumerate() {
        let row = 8 + offset as u32;
        worksheet
            .write_number(row, 0, (offset + 1) as f64)
            .expect("should write line number");
        worksheet
            .write_string(row, 2, *identifier)
            .expect("should write identifier");
    }
    workbook.save(path).expect("should save target workbook");
}

#[test]
fn import_then_fill_writes_seal_and_package_count() {
    let repo = Arc::new(MemoryRepo::default());
    let import_service = ImportService::new(repo.clone());
    let mut store = import_service.load_store();

    let summary = import_service
        .import_grid(&source_grid(), &mut store)
        .expect("import should succeed");

    assert_eq!(summary.header_row, 2);
    assert_eq!(summary.identifier_column, 1);
    assert_eq!(summary.rows_imported, 1);
    assert!(summary.saved);

    let mut sheet = WorkbookSheet::from_grid("Sheet1", &target_grid("CNT001"));
    let fill_summary = FillService::default().fill_sheet(&mut sheet, &store);

    assert_eq!(fill_summary.updates, 2);
    assert_eq!(fill_summary.rows_matched, 1);
    assert_eq!(sheet.cell(9, 6), Ok(CellValue::from("S99")));
    assert_eq!(sheet.cell(9, 11), Ok(CellValue::Number(50.0)));
}

#[test]
fn import_saves_store_through_repository() {
    let repo = Arc::new(MemoryRepo::default());
    let import_service = ImportService::new(repo.clone());
    let mut store = Store::new();

    import_service
        .import_grid(&source_grid(), &mut store)
        .expect("import should succeed");

    let saved = repo.load().expect("memory repo should load");
    assert_eq!(saved, store);
}

#[test]
fn failed_save_keeps_in_memory_store() {
    let repo = Arc::new(MemoryRepo {
        saved: Mutex::new(None),
        fail_save: true,
    });
    let import_service = ImportService::new(repo);
    let mut store = Store::new();

    let summary = import_service
        .import_grid(&source_grid(), &mut store)
        .expect("save failure should not abort import");

    assert!(!summary.saved);
    assert_eq!(summary.record_count, 1);
    assert!(store.contains_key("CNT001"));
}

#[test]
fn missing_header_aborts_import_without_saving() {
    let repo = Arc::new(MemoryRepo::default());
    let import_service = ImportService::new(repo.clone());
    let mut store = Store::new();
    let grid = Grid::from_text_rows(vec![vec!["Box", "Seal"], vec!["C1", "S1"]]);

    let result = import_service.import_grid(&grid, &mut store);

    assert_eq!(
        result,
        Err(ReconcileError::HeaderNotFound { scanned_rows: 2 })
    );
    assert!(store.is_empty());
    assert!(repo
        .saved
        .lock()
        .expect("lock should not be poisoned")
        .is_none());
}

#[test]
fn fixed_header_detector_imports_known_layout() {
    let detector = FixedHeaderDetector {
        location: HeaderLocation {
            header_row: 0,
            identifier_column: 0,
        },
    };
    let import_service =
        ImportService::with_detector(Arc::new(MemoryRepo::default()), Arc::new(detector));
    let grid = Grid::from_text_rows(vec![vec!["Box ID", "Weight"], vec!["B-1", "900"]]);
    let mut store = Store::new();

    let summary = import_service
        .import_grid(&grid, &mut store)
        .expect("import should succeed");

    assert_eq!(summary.rows_imported, 1);
    assert_eq!(store.get("B1").and_then(|r| r.get("WEIGHT")), Some("900"));
}

#[test]
fn json_store_round_trip_preserves_field_order() {
    let temp_dir = unique_test_dir("json-store");
    let store_path = temp_dir.join("nested").join("shipping_database.json");
    let repo = JsonStoreRepo::new(store_path.clone());

    let mut store = Store::new();
    let record = store.record_mut("CNT001").expect("valid key");
    record.set("SEAL", "S99");
    record.set("BROKER", "ACME");
    record.set("PKGQTY", "50");

    repo.save(&store).expect("save should succeed");
    let loaded = repo.load().expect("load should succeed");

    let fields: Vec<_> = loaded
        .get("CNT001")
        .expect("record should exist")
        .iter()
        .collect();
    assert_eq!(
        fields,
        vec![("SEAL", "S99"), ("BROKER", "ACME"), ("PKGQTY", "50")]
    );

    let text = fs::read_to_string(&store_path).expect("store file should exist");
    assert!(text.contains("\n    \"CNT001\": {\n        \"SEAL\": \"S99\""));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn json_store_missing_file_loads_empty() {
    let temp_dir = unique_test_dir("json-missing");
    let repo = JsonStoreRepo::new(temp_dir.join("shipping_database.json"));

    let store = repo.load().expect("missing file is an empty store");

    assert!(store.is_empty());
}

#[test]
fn corrupt_store_falls_back_to_empty() {
    let temp_dir = unique_test_dir("json-corrupt");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let store_path = temp_dir.join("shipping_database.json");
    fs::write(&store_path, "{ not json").expect("should write fixture");
    let import_service = ImportService::new(Arc::new(JsonStoreRepo::new(store_path)));

    let store = import_service.load_store();

    assert!(store.is_empty());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn unwritable_store_path_is_reported_not_raised() {
    let temp_dir = unique_test_dir("json-unwritable");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let import_service = ImportService::new(Arc::new(JsonStoreRepo::new(temp_dir.clone())));
    let mut store = Store::new();

    let summary = import_service
        .import_grid(&source_grid(), &mut store)
        .expect("import should succeed");

    assert!(!summary.saved);
    assert_eq!(store.len(), 1);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn csv_file_with_offset_header_is_imported() {
    let temp_dir = unique_test_dir("csv-import");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("booking.csv");
    fs::write(
        &csv_path,
        "Vessel: EVER GIVEN\n,,,\nNo.,Container No.,Gross Weight (KGS),Description\n1,ABCD-1234567,1000, Cotton shirts \n2,,5,\n",
    )
    .expect("should write csv fixture");

    let import_service = ImportService::new(Arc::new(MemoryRepo::default()));
    let mut store = Store::new();
    let summary = import_service
        .import_file(&csv_path, &mut store)
        .expect("import should succeed");

    assert_eq!(summary.header_row, 2);
    assert_eq!(summary.rows_imported, 1);
    let expected: Record = [
        ("NO", "1"),
        ("CONTAINERNO", "ABCD-1234567"),
        ("GROSSWEIGHTKGS", "1000"),
        ("DESCRIPTION", "Cotton shirts"),
    ]
    .into_iter()
    .collect();
    assert_eq!(store.get("ABCD1234567"), Some(&expected));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn csv_falls_back_to_latin1() {
    let temp_dir = unique_test_dir("csv-latin1");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let csv_path = temp_dir.join("latin1.csv");
    fs::write(&csv_path, b"Container,Goods\nCNT1,Caf\xe9 beans\n").expect("should write fixture");

    let grid = read_csv_grid(&csv_path).expect("latin1 csv should be readable");

    assert_eq!(grid.cell(1, 1), &CellValue::from("Café beans"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn workbook_grid_is_anchored_at_a1() {
    let temp_dir = unique_test_dir("xlsx-anchor");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let xlsx_path = temp_dir.join("source.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .write_string(2, 1, "Container")
        .expect("should write header");
    worksheet
        .write_string(3, 1, "CNT9")
        .expect("should write identifier");
    worksheet
        .write_number(3, 2, 12.5)
        .expect("should write number");
    workbook.save(&xlsx_path).expect("should save workbook");

    let grid = read_source_grid(&xlsx_path).expect("workbook should be readable");

    assert_eq!(grid.cell(2, 1), &CellValue::from("Container"));
    assert_eq!(grid.cell(3, 2), &CellValue::Number(12.5));
    assert_eq!(grid.cell(0, 0), &CellValue::Empty);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn fill_file_saves_filled_copy_next_to_target() {
    let temp_dir = unique_test_dir("fill-file");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let target_path = temp_dir.join("manifest.xlsx");
    write_target_workbook(&target_path, &["CNT-001", "UNKNOWN1"]);

    let output_path = temp_dir.join("manifest_Filled.xlsx");
    fs::write(&output_path, "stale").expect("should write stale output");

    let mut store = Store::new();
    ImportService::new(Arc::new(MemoryRepo::default()))
        .import_grid(&source_grid(), &mut store)
        .expect("import should succeed");

    let summary = FillService::default()
        .fill_file(&target_path, &store)
        .expect("fill should succeed");

    assert_eq!(summary.updates, 2);
    assert_eq!(summary.rows_scanned, 2);
    assert_eq!(summary.output_path.as_deref(), Some(output_path.as_path()));

    let (sheet_name, grid) = read_first_sheet(&output_path).expect("output should be readable");
    assert_eq!(sheet_name, "Manifest");
    assert_eq!(grid.cell(0, 0), &CellValue::from("Loading list"));
    assert_eq!(grid.cell(8, 5), &CellValue::from("S99"));
    assert_eq!(grid.cell(8, 10), &CellValue::Number(50.0));
    assert_eq!(grid.cell(9, 5), &CellValue::Empty);

    let (_, original) = read_first_sheet(&target_path).expect("target should be readable");
    assert_eq!(original.cell(8, 5), &CellValue::Empty);

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn fill_file_keeps_other_sheets_formulas_and_dates() {
    let temp_dir = unique_test_dir("fill-workbook");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let target_path = temp_dir.join("manifest.xlsx");

    let mut workbook = Workbook::new();
    let manifest = workbook.add_worksheet();
    manifest.set_name("Manifest").expect("valid sheet name");
    let etd = ExcelDateTime::from_ymd(2026, 10, 19).expect("valid date");
    manifest
        .write_datetime_with_format(1, 0, &etd, &Format::new().set_num_format("dd/mm/yyyy"))
        .expect("should write date");
    manifest
        .write_formula(0, 5, "=1+1")
        .expect("should write formula");
    manifest
        .write_string(8, 2, "CNT001")
        .expect("should write identifier");
    let notes = workbook.add_worksheet();
    notes.set_name("Notes").expect("valid sheet name");
    notes
        .write_string(0, 0, "Remarks")
        .expect("should write remarks");
    notes
        .write_formula(0, 1, "=LEN(A1)")
        .expect("should write formula");
    workbook.save(&target_path).expect("should save target workbook");

    let mut store = Store::new();
    store
        .record_mut("CNT001")
        .expect("valid key")
        .set("SEAL", "S99");

    let summary = FillService::default()
        .fill_file(&target_path, &store)
        .expect("fill should succeed");
    let output_path = summary.output_path.expect("output should be saved");

    let mut output = open_workbook_auto(&output_path).expect("output should open");
    assert_eq!(output.sheet_names(), vec!["Manifest", "Notes"]);

    let manifest_formulas = output
        .worksheet_formula("Manifest")
        .expect("formulas should be readable");
    assert_eq!(
        manifest_formulas.get_value((0, 5)).map(String::as_str),
        Some("1+1")
    );
    let notes_formulas = output
        .worksheet_formula("Notes")
        .expect("formulas should be readable");
    assert_eq!(
        notes_formulas.get_value((0, 1)).map(String::as_str),
        Some("LEN(A1)")
    );

    let (_, grid) = read_first_sheet(&output_path).expect("output should be readable");
    assert_eq!(grid.cell(1, 0), &CellValue::DateTime(46314.0));
    assert_eq!(grid.cell(8, 5), &CellValue::from("S99"));

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn source_dates_are_stored_as_timestamps() {
    let temp_dir = unique_test_dir("xlsx-dates");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let xlsx_path = temp_dir.join("source.xlsx");

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .write_string(0, 0, "Container")
        .expect("should write header");
    worksheet.write_string(0, 1, "ETD").expect("should write header");
    worksheet
        .write_string(1, 0, "CNT7")
        .expect("should write identifier");
    let etd = ExcelDateTime::from_ymd(2026, 10, 19).expect("valid date");
    worksheet
        .write_datetime_with_format(1, 1, &etd, &Format::new().set_num_format("yyyy-mm-dd"))
        .expect("should write date");
    workbook.save(&xlsx_path).expect("should save workbook");

    let mut store = Store::new();
    ImportService::new(Arc::new(MemoryRepo::default()))
        .import_file(&xlsx_path, &mut store)
        .expect("import should succeed");

    assert_eq!(
        store.get("CNT7").and_then(|r| r.get("ETD")),
        Some("2026-10-19 00:00:00")
    );

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn fill_file_without_matches_writes_nothing() {
    let temp_dir = unique_test_dir("fill-nomatch");
    fs::create_dir_all(&temp_dir).expect("should create temp dir");
    let target_path = temp_dir.join("manifest.xlsx");
    write_target_workbook(&target_path, &["CNT404"]);

    let summary = FillService::default()
        .fill_file(&target_path, &Store::new())
        .expect("fill should succeed");

    assert_eq!(summary.updates, 0);
    assert!(summary.output_path.is_none());
    assert!(!filled_output_path(&target_path).exists());

    fs::remove_dir_all(&temp_dir).expect("should cleanup temp dir");
}

#[test]
fn cell_failures_are_isolated() {
    let mut store = Store::new();
    let record = store.record_mut("CNT001").expect("valid key");
    record.set("SEAL", "S99");
    record.set("GROSSWEIGHT", "1000");
    record.set("VGM", "1200");

    let mut sheet = FlakySheet {
        inner: WorkbookSheet::from_grid("Sheet1", &target_grid("CNT001")),
        broken_column: 12,
    };

    let summary = FillService::default().fill_sheet(&mut sheet, &store);

    assert_eq!(summary.updates, 2);
    assert_eq!(summary.cell_failures, 1);
    assert_eq!(summary.rows_scanned, (USED_ROWS_FALLBACK - 8) as usize);
    assert_eq!(sheet.inner.cell(9, 6), Ok(CellValue::from("S99")));
    assert_eq!(sheet.inner.cell(9, 21), Ok(CellValue::Number(1200.0)));
    assert_eq!(sheet.inner.cell(9, 12), Ok(CellValue::Empty));
}

#[test]
fn closed_sheet_after_failed_save_is_not_reused() {
    let temp_dir = unique_test_dir("fill-save-fail");
    let target_path = temp_dir.join("missing-dir").join("manifest.xlsx");

    let mut store = Store::new();
    store
        .record_mut("CNT001")
        .expect("valid key")
        .set("SEAL", "S99");
    let mut sheet = WorkbookSheet::from_grid("Sheet1", &target_grid("CNT001"));

    let result = FillService::default().fill_and_save(&mut sheet, &target_path, &store);

    assert!(result.is_err());
    assert!(sheet.is_closed());
}

#[test]
fn filled_output_path_appends_suffix() {
    let path = Path::new("/data/march/manifest.v2.xlsx");

    assert_eq!(
        filled_output_path(path),
        PathBuf::from("/data/march/manifest.v2_Filled.xlsx")
    );
}
