use crate::domain::entities::grid::CellValue;

/// Canonical comparison form of an identifier or header: ASCII-uppercased with
/// everything outside `A-Z0-9` removed. Missing cells normalize to `""`.
pub fn normalize(value: &CellValue) -> String {
    if value.is_missing() {
        return String::new();
    }
    normalize_str(&value.to_text())
}

pub fn normalize_str(text: &str) -> String {
    text.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        .collect()
}
