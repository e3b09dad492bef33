//! Shared test utilities and fixtures.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};

use bzip2::Compression;
use bzip2::write::BzEncoder;
use odds_history::Result;
use odds_history::historic::{FileFilter, MarketSource, local_file_name};
use odds_history::error::OddsError;

/// El Clásico match-odds stream: 7 price entries, 3 lines without any.
pub const REAL_MADRID_V_BARCELONA: &str = include_str!("../fixtures/real_madrid_v_barcelona.jsonl");
/// Valid definition, later line references selection 40.
pub const UNKNOWN_SELECTION: &str = include_str!("../fixtures/unknown_selection.jsonl");
/// Over/under market, must be rejected.
pub const OVER_UNDER: &str = include_str!("../fixtures/over_under.jsonl");

/// bzip2-compresses `data`.
pub fn compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).expect("compress fixture");
    encoder.finish().expect("finish compression")
}

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture file");
    path
}

/// Serves canned archive files instead of the historic-data service.
#[derive(Default)]
pub struct FixtureSource {
    files: Vec<(String, Vec<u8>)>,
}

impl FixtureSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a market stream, stored bzip2-compressed like the real archive.
    pub fn with_market(mut self, path: &str, stream: &str) -> Self {
        self.files.push((path.to_string(), compress(stream.as_bytes())));
        self
    }

    /// Adds a file served byte-for-byte.
    pub fn with_raw(mut self, path: &str, bytes: Vec<u8>) -> Self {
        self.files.push((path.to_string(), bytes));
        self
    }
}

impl MarketSource for FixtureSource {
    async fn file_list(&self, _filter: &FileFilter) -> Result<Vec<String>> {
        Ok(self.files.iter().map(|(path, _)| path.clone()).collect())
    }

    async fn download_file(&self, file_path: &str, dir: &Path) -> Result<PathBuf> {
        let (_, bytes) = self
            .files
            .iter()
            .find(|(path, _)| path == file_path)
            .ok_or_else(|| OddsError::Provider(format!("no fixture for {file_path}")))?;
        Ok(write_file(dir, local_file_name(file_path)?, bytes))
    }
}
