//! Crate-level error types.
//!
//! [`OddsError`] unifies every fatal condition (configuration, transport,
//! decompression, market-definition checks, selection lookup) behind a
//! single enum so callers can match on the variant they care about while
//! still using the `?` operator for easy propagation.
//!
//! Per-line parse failures inside a market stream are not errors at all:
//! they surface as [`LineOutcome::Ignored`](crate::parser::LineOutcome::Ignored).

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OddsError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum OddsError {
    /// Required configuration is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The credentials file could not be read or is incomplete.
    #[error("credentials error: {0}")]
    Credentials(String),

    /// The client certificate or key could not be loaded.
    #[error("tls error: {0}")]
    Tls(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a local file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding or decoding the odds CSV table failed.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The compressed stream is corrupt or truncated.
    #[error("decompression error: {0}")]
    Decompress(String),

    /// The market file has no definition line.
    #[error("market file is empty")]
    EmptyFile,

    /// The first line does not carry a usable market definition.
    #[error("malformed market definition: {0}")]
    MalformedDefinition(String),

    /// The market is not a match-odds market.
    #[error("unexpected market type {found:?}, expected MATCH_ODDS")]
    UnexpectedMarketType { found: String },

    /// Fewer than three runners in the market definition.
    #[error("market definition has {found} runners, expected at least 3")]
    MissingRunners { found: usize },

    /// The third runner is not the draw.
    #[error("third runner is {found:?}, expected \"The Draw\"")]
    UnexpectedDrawName { found: String },

    /// A price change references a selection the market does not define.
    #[error("unknown selection id {0}")]
    UnknownSelection(u64),

    /// A timestamp is outside the representable range or badly formatted.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// The historic-data provider rejected a request.
    #[error("provider error: {0}")]
    Provider(String),

    /// The object store rejected a request.
    #[error("storage error: {0}")]
    Storage(String),
}
