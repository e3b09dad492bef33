use serde::Deserialize;

/// Last traded price update for one selection.
///
/// Both fields are required: an entry without `ltp` makes the whole line
/// unusable, which the parser reports as an ignored line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RunnerChange {
    /// Selection id.
    pub id: u64,
    /// Last traded price (decimal odds).
    pub ltp: f64,
}
