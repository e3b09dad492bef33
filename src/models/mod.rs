//! Serde models for the exchange's archived market-change stream.
//!
//! Every line of a decompressed market file is a market-change message
//! (`"op": "mcm"`) carrying a publish time and a list of market changes.
//! The first line holds the market definition, later lines mostly carry
//! runner changes with last traded prices.

pub mod definition;
pub mod runner_change;

use serde::Deserialize;

pub use definition::{MarketDefinition, Runner};
pub use runner_change::RunnerChange;

/// Market type of a football match-result market.
pub const MATCH_ODDS: &str = "MATCH_ODDS";

/// Name the exchange gives the draw runner in match-odds markets.
pub const DRAW_RUNNER_NAME: &str = "The Draw";

/// Envelope of the definition line.
#[derive(Debug, Deserialize)]
pub struct DefinitionMessage {
    pub mc: Vec<DefinitionChange>,
}

/// A market change that may carry a full market definition.
#[derive(Debug, Deserialize)]
pub struct DefinitionChange {
    #[serde(rename = "marketDefinition")]
    pub market_definition: Option<MarketDefinition>,
}

/// Envelope of a price-change line.
///
/// Only the fields needed to build an odds series are modelled; everything
/// else in the message (clock tokens, definitions, ladders) is skipped.
#[derive(Debug, Deserialize)]
pub struct PriceChangeMessage {
    /// Publish time in milliseconds since the Unix epoch.
    pub pt: i64,
    pub mc: Vec<PriceMarketChange>,
}

/// A market change with optional runner changes (`rc`).
#[derive(Debug, Deserialize)]
pub struct PriceMarketChange {
    #[serde(default)]
    pub rc: Option<Vec<RunnerChange>>,
}
