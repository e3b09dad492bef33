//! Odds time-series construction.
//!
//! Folds the ordered price changes of one market into [`OddsRecord`] rows:
//! the selection id is resolved to a display name, the publish time is
//! truncated to whole seconds and shown in local time, and each row is
//! tagged in-play when it was published at or after the scheduled start.
//! Rows keep input order; nothing is sorted, merged or deduplicated.

use std::collections::HashMap;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::error::OddsError;
use crate::models::MarketDefinition;
use crate::parser::PriceChange;

/// Display name used for the draw selection in the output table.
pub const DRAW_SELECTION: &str = "Draw";

/// Format of the exchange's `marketTime` field.
const MARKET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";

/// One row of the odds table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OddsRecord {
    /// Local wall-clock publish time, second precision.
    #[serde(with = "crate::table::timestamp_format")]
    pub timestamp: NaiveDateTime,
    pub selection: String,
    pub odds: f64,
    #[serde(with = "crate::table::bool_format")]
    pub inplay: bool,
}

/// The odds table for one market plus the name it should be stored under.
#[derive(Debug, Clone)]
pub struct OddsSeries {
    /// `<YYYY-MM-DD>_<event name>.csv`
    pub file_name: String,
    pub event_name: String,
    pub market_start: DateTime<Utc>,
    pub records: Vec<OddsRecord>,
}

/// Maps selection ids of a match-odds market to display names.
#[derive(Debug, Clone)]
pub struct SelectionNames(HashMap<u64, String>);

impl SelectionNames {
    /// Builds the mapping home → name, away → name, draw → `"Draw"`.
    ///
    /// The definition must already have passed
    /// [`parse_definition`](crate::parser::parse_definition).
    pub fn from_definition(definition: &MarketDefinition) -> Self {
        let mut names = HashMap::with_capacity(3);
        for runner in definition.runners.iter().take(2) {
            names.insert(runner.id, runner.name.clone());
        }
        if let Some(draw) = definition.runners.get(2) {
            names.insert(draw.id, DRAW_SELECTION.to_string());
        }
        Self(names)
    }

    /// Looks up a selection id.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::UnknownSelection`] if the market does not define the id.
    pub fn resolve(&self, selection_id: u64) -> Result<&str> {
        self.0
            .get(&selection_id)
            .map(String::as_str)
            .ok_or(OddsError::UnknownSelection(selection_id))
    }
}

/// Parses the scheduled start of the market.
///
/// # Errors
///
/// Returns [`OddsError::InvalidTimestamp`] if `marketTime` is not of the
/// form `YYYY-MM-DDTHH:MM:SS.fffZ`.
pub fn market_start(definition: &MarketDefinition) -> Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(&definition.market_time, MARKET_TIME_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| {
            OddsError::InvalidTimestamp(format!("marketTime {:?}: {e}", definition.market_time))
        })
}

/// Suggested storage name for a market's odds table.
///
/// Path separators in the event name become `-`, so the name is always a
/// single path component.
pub fn series_file_name(event_name: &str, market_start: DateTime<Utc>) -> String {
    let event: String = event_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{}_{}.csv", market_start.format("%Y-%m-%d"), event)
}

/// Builds the odds series with timestamps in the machine's local time zone.
///
/// # Errors
///
/// See [`build_series_in`].
pub fn build_series(definition: &MarketDefinition, changes: &[PriceChange]) -> Result<OddsSeries> {
    build_series_in(definition, changes, &Local)
}

/// Builds the odds series with timestamps rendered in `tz`.
///
/// The in-play flag compares absolute instants, so it does not depend on `tz`.
///
/// # Errors
///
/// Fails as a whole, returning no rows, on the first unknown selection id
/// ([`OddsError::UnknownSelection`]) or unrepresentable timestamp
/// ([`OddsError::InvalidTimestamp`]).
pub fn build_series_in<Tz: TimeZone>(
    definition: &MarketDefinition,
    changes: &[PriceChange],
    tz: &Tz,
) -> Result<OddsSeries> {
    let names = SelectionNames::from_definition(definition);
    let start = market_start(definition)?;

    let records = changes
        .iter()
        .map(|change| {
            let selection = names.resolve(change.selection_id)?;
            let published = publish_time(change.timestamp_ms)?;
            Ok(OddsRecord {
                timestamp: published.with_timezone(tz).naive_local(),
                selection: selection.to_string(),
                odds: change.ltp,
                inplay: published >= start,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(OddsSeries {
        file_name: series_file_name(&definition.event_name, start),
        event_name: definition.event_name.clone(),
        market_start: start,
        records,
    })
}

/// Converts an epoch-millisecond publish time to a whole-second UTC instant.
fn publish_time(timestamp_ms: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp_ms.div_euclid(1000), 0)
        .ok_or_else(|| OddsError::InvalidTimestamp(format!("publish time {timestamp_ms} ms")))
}
