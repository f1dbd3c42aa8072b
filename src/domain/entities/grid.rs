use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// A single cell as handed over by a tabular reader.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Int(i64),
    Bool(bool),
    /// Excel serial date, days since 1899-12-30 with the time as fraction.
    DateTime(f64),
}

impl CellValue {
    /// Missing cells never contribute a field value during ingest.
    pub fn is_missing(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(v) => v.is_empty(),
            CellValue::Number(v) => v.is_nan(),
            CellValue::Int(_) | CellValue::Bool(_) | CellValue::DateTime(_) => false,
        }
    }

    pub fn to_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(v) => v.clone(),
            CellValue::Number(v) if v.is_nan() => String::new(),
            CellValue::Number(v) => v.to_string(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Bool(v) => v.to_string(),
            CellValue::DateTime(v) => serial_to_datetime(*v)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| v.to_string()),
        }
    }
}

/// Converts an Excel serial date in the 1900 date system. Serials before
/// 1900-03-01 account for the leap day Excel counts in 1900.
pub fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !(0.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let serial = if serial < 60.0 { serial + 1.0 } else { serial };
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

/// Row-major 2-D grid; rows may have different lengths.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub rows: Vec<Vec<CellValue>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<CellValue>>) -> Self {
        Self { rows }
    }

    #[cfg(test)]
    pub fn from_text_rows(rows: Vec<Vec<&str>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|cell| {
                            if cell.is_empty() {
                                CellValue::Empty
                            } else {
                                CellValue::from(cell)
                            }
                        })
                        .collect()
                })
                .collect(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row_idx: usize, col_idx: usize) -> &CellValue {
        const EMPTY: &CellValue = &CellValue::Empty;
        self.rows
            .get(row_idx)
            .and_then(|row| row.get(col_idx))
            .unwrap_or(EMPTY)
    }
}
