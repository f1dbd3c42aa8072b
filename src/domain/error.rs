#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    /// No row in the scan window carries an identifier header.
    HeaderNotFound { scanned_rows: usize },
    /// A single target cell could not be read or written.
    CellAccess {
        row: u32,
        column: u32,
        message: String,
    },
    Persistence(String),
}

impl std::fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReconcileError::HeaderNotFound { scanned_rows } => write!(
                f,
                "No 'Container' column found in the first {scanned_rows} rows."
            ),
            ReconcileError::CellAccess {
                row,
                column,
                message,
            } => write!(f, "cell ({row}, {column}) is not accessible: {message}"),
            ReconcileError::Persistence(message) => write!(f, "store persistence failed: {message}"),
        }
    }
}

impl std::error::Error for ReconcileError {}
