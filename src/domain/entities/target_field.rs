/// Canonical output column of the target sheet and the header keywords that
/// identify it among a record's fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetField {
    pub name: &'static str,
    /// 1-based destination column.
    pub column: u32,
    /// Normalized tokens, tested in declared order.
    pub keywords: &'static [&'static str],
}

impl TargetField {
    pub fn matches_header(&self, header: &str) -> bool {
        self.keywords.iter().any(|keyword| header.contains(keyword))
    }
}
