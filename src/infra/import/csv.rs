use std::path::Path;

use anyhow::{Context, Result};
use csv::{ByteRecord, ReaderBuilder};

use crate::domain::entities::grid::{CellValue, Grid};

/// Reads every line of a CSV file as a grid row; there is no header row at
/// the CSV level because the header can sit anywhere in the file.
///
/// Files that are not valid UTF-8 are decoded as Latin-1 instead.
pub fn read_csv_grid(csv_path: &Path) -> Result<Grid> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(csv_path)
        .with_context(|| format!("failed to open csv: {}", csv_path.display()))?;

    let mut records: Vec<ByteRecord> = Vec::new();
    for record in reader.byte_records() {
        records.push(record.context("failed to parse csv record")?);
    }

    let is_utf8 = records
        .iter()
        .all(|record| record.iter().all(|field| std::str::from_utf8(field).is_ok()));
    if !is_utf8 {
        log::info!(
            "{} is not valid UTF-8, decoding as Latin-1",
            csv_path.display()
        );
    }

    let rows = records
        .iter()
        .map(|record| {
            record
                .iter()
                .map(|field| {
                    let text = if is_utf8 {
                        String::from_utf8_lossy(field).into_owned()
                    } else {
                        decode_latin1(field)
                    };
                    if text.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(text)
                    }
                })
                .collect()
        })
        .collect();

    Ok(Grid::new(rows))
}

fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
