//! Market message parsing.
//!
//! A decompressed market file is line-delimited JSON. The first line must
//! carry a match-odds market definition; a broken definition is fatal for
//! the file. Every later line is classified independently into a
//! [`LineOutcome`]: either the price changes it carries or
//! [`LineOutcome::Ignored`]. Lines of another message kind and lines that
//! are malformed both end up as `Ignored` and cannot be told apart.

use std::io::BufRead;

use crate::Result;
use crate::error::OddsError;
use crate::models::{
    DRAW_RUNNER_NAME, DefinitionMessage, MATCH_ODDS, MarketDefinition, PriceChangeMessage,
};

/// One last-traded-price observation taken from a message line.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChange {
    /// Publish time of the enclosing message, epoch milliseconds.
    pub timestamp_ms: i64,
    pub selection_id: u64,
    pub ltp: f64,
}

/// Result of classifying a single message line.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    /// The line carried a runner-change section; one entry per change, in order.
    PriceChanges(Vec<PriceChange>),
    /// Nothing to extract: other message kind, missing fields, or malformed JSON.
    Ignored,
}

/// A fully parsed market file.
#[derive(Debug, Clone)]
pub struct ParsedMarket {
    pub definition: MarketDefinition,
    /// Price changes in file order.
    pub changes: Vec<PriceChange>,
    /// Number of message lines that contributed nothing.
    pub ignored_lines: usize,
}

/// Parses and validates the definition line.
///
/// # Errors
///
/// - [`OddsError::MalformedDefinition`] if the line is not a market-change
///   message whose first change carries a market definition.
/// - [`OddsError::UnexpectedMarketType`] if the market is not `MATCH_ODDS`.
/// - [`OddsError::MissingRunners`] if fewer than three runners are listed.
/// - [`OddsError::UnexpectedDrawName`] if the third runner is not the draw.
pub fn parse_definition(line: &str) -> Result<MarketDefinition> {
    let message: DefinitionMessage = serde_json::from_str(line)
        .map_err(|e| OddsError::MalformedDefinition(e.to_string()))?;

    let definition = message
        .mc
        .into_iter()
        .next()
        .ok_or_else(|| OddsError::MalformedDefinition("no market change on first line".into()))?
        .market_definition
        .ok_or_else(|| {
            OddsError::MalformedDefinition("first line has no marketDefinition".into())
        })?;

    if definition.market_type != MATCH_ODDS {
        return Err(OddsError::UnexpectedMarketType {
            found: definition.market_type,
        });
    }

    if definition.runners.len() < 3 {
        return Err(OddsError::MissingRunners {
            found: definition.runners.len(),
        });
    }

    if definition.runners[2].name != DRAW_RUNNER_NAME {
        return Err(OddsError::UnexpectedDrawName {
            found: definition.runners[2].name.clone(),
        });
    }

    Ok(definition)
}

/// Classifies one message line.
///
/// Only the first market change of the line is inspected, matching the
/// single-market layout of the archive files.
pub fn parse_line(line: &str) -> LineOutcome {
    let Ok(message) = serde_json::from_str::<PriceChangeMessage>(line) else {
        return LineOutcome::Ignored;
    };

    let Some(runner_changes) = message.mc.into_iter().next().and_then(|mc| mc.rc) else {
        return LineOutcome::Ignored;
    };

    LineOutcome::PriceChanges(
        runner_changes
            .into_iter()
            .map(|rc| PriceChange {
                timestamp_ms: message.pt,
                selection_id: rc.id,
                ltp: rc.ltp,
            })
            .collect(),
    )
}

/// Parses a whole decompressed market file.
///
/// # Errors
///
/// Returns [`OddsError::EmptyFile`] when there is no first line, any error
/// from [`parse_definition`], or [`OddsError::Io`] if reading fails.
pub fn parse_market<R: BufRead>(reader: R) -> Result<ParsedMarket> {
    let mut lines = reader.lines();

    let first = lines.next().ok_or(OddsError::EmptyFile)??;
    let definition = parse_definition(&first)?;

    let mut changes = Vec::new();
    let mut ignored_lines = 0;

    for line in lines {
        match parse_line(&line?) {
            LineOutcome::PriceChanges(batch) => changes.extend(batch),
            LineOutcome::Ignored => ignored_lines += 1,
        }
    }

    Ok(ParsedMarket {
        definition,
        changes,
        ignored_lines,
    })
}
