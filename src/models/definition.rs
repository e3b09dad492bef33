use serde::Deserialize;

/// Market metadata sent on the first line of every market file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketDefinition {
    pub market_type: String,
    pub runners: Vec<Runner>,
    /// Scheduled start, e.g. `2024-11-01T20:00:00.000Z`.
    pub market_time: String,
    pub event_name: String,
}

/// One outcome of the market: a team or the draw.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Runner {
    /// Selection id.
    pub id: u64,
    pub name: String,
}
