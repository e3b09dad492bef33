//! Historic exchange odds library.
//!
//! Downloads archived market-change streams from the exchange's
//! historic-data service, decompresses them and rebuilds a per-match time
//! series of last traded prices (home, away, draw) with an in-play flag.
//! Resulting tables are stored as CSV, locally and in object storage.

pub mod config;
pub mod credentials;
pub mod decompress;
pub mod error;
pub mod historic;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod series;
pub mod storage;
pub mod table;
pub mod tls;

pub use error::{OddsError, Result};
