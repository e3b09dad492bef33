//! End-to-end processing of archived market files.
//!
//! Per file: download, decompress next to the download, parse, build the
//! odds series, write it as CSV under the work directory and, when a store
//! is configured, upload it under its suggested name. A fatal error aborts
//! only the file it occurred in; the run moves on to the next file.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::{Local, TimeZone};
use tracing::{debug, info, warn};

use crate::Result;
use crate::config::DownloadConfig;
use crate::decompress::decompress_file;
use crate::error::OddsError;
use crate::historic::MarketSource;
use crate::parser::parse_market;
use crate::series::{OddsSeries, build_series_in};
use crate::storage::{ObjectStore, write_odds_csv};
use crate::table::write_csv_file;

/// A market file that made it all the way through.
#[derive(Debug, Clone)]
pub struct ProcessedFile {
    /// Provider path of the archive file.
    pub source: String,
    /// Local CSV written for it.
    pub csv_path: PathBuf,
    /// Object key (also the CSV file name).
    pub key: String,
    pub rows: usize,
    pub uploaded: bool,
}

/// A market file that was abandoned.
#[derive(Debug)]
pub struct FailedFile {
    pub source: String,
    pub error: OddsError,
}

/// Summary of a [`run`].
#[derive(Debug, Default)]
pub struct RunReport {
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
}

impl RunReport {
    pub fn total_rows(&self) -> usize {
        self.processed.iter().map(|p| p.rows).sum()
    }
}

/// Builds the odds series of a decompressed market file, in local time.
///
/// # Errors
///
/// Any fatal parse or build error; no partial series is returned.
pub fn process_odds_file(path: &Path) -> Result<OddsSeries> {
    process_odds_file_in(path, &Local)
}

/// Builds the odds series of a decompressed market file with timestamps in `tz`.
pub fn process_odds_file_in<Tz: TimeZone>(path: &Path, tz: &Tz) -> Result<OddsSeries> {
    let parsed = parse_market(BufReader::new(File::open(path)?))?;
    debug!(
        path = %path.display(),
        changes = parsed.changes.len(),
        ignored_lines = parsed.ignored_lines,
        "Parsed market file"
    );
    build_series_in(&parsed.definition, &parsed.changes, tz)
}

/// Decompresses a downloaded market file and builds its odds series.
pub fn process_compressed_file(path: &Path) -> Result<OddsSeries> {
    let decompressed = decompress_file(path)?;
    process_odds_file(&decompressed)
}

/// Writes `series` as CSV into `dir` and uploads it when `store` is given.
///
/// Returns the local CSV path and whether an upload happened.
pub async fn export_series<S: ObjectStore>(
    series: &OddsSeries,
    dir: &Path,
    store: Option<(&S, &str)>,
) -> Result<(PathBuf, bool)> {
    let csv_path = dir.join(&series.file_name);
    write_csv_file(&csv_path, &series.records)?;

    let uploaded = match store {
        Some((store, bucket)) => {
            write_odds_csv(store, bucket, &series.file_name, &series.records).await?;
            true
        }
        None => false,
    };
    Ok((csv_path, uploaded))
}

/// Downloads and processes every file matching the configured filter.
///
/// # Errors
///
/// Only listing failures and an uncreatable work directory abort the run;
/// per-file failures are collected in [`RunReport::failed`].
pub async fn run<P: MarketSource, S: ObjectStore>(
    source: &P,
    store: Option<(&S, &str)>,
    download: &DownloadConfig,
) -> Result<RunReport> {
    tokio::fs::create_dir_all(&download.work_dir).await?;
    let files = source.file_list(&download.filter).await?;
    info!(files = files.len(), work_dir = %download.work_dir.display(), "Processing market files");

    let mut report = RunReport::default();
    for file_path in files {
        match process_remote(source, store, &download.work_dir, &file_path).await {
            Ok(processed) => {
                info!(
                    source = file_path,
                    key = processed.key,
                    rows = processed.rows,
                    uploaded = processed.uploaded,
                    "Market file processed"
                );
                report.processed.push(processed);
            }
            Err(error) => {
                warn!(source = file_path, %error, "Market file abandoned");
                report.failed.push(FailedFile {
                    source: file_path,
                    error,
                });
            }
        }
    }

    info!(
        processed = report.processed.len(),
        failed = report.failed.len(),
        rows = report.total_rows(),
        "Run finished"
    );
    Ok(report)
}

async fn process_remote<P: MarketSource, S: ObjectStore>(
    source: &P,
    store: Option<(&S, &str)>,
    work_dir: &Path,
    file_path: &str,
) -> Result<ProcessedFile> {
    let compressed = source.download_file(file_path, work_dir).await?;

    let series = tokio::task::spawn_blocking(move || process_compressed_file(&compressed))
        .await
        .map_err(|e| OddsError::Io(std::io::Error::other(e)))??;

    let (csv_path, uploaded) = export_series(&series, work_dir, store).await?;
    Ok(ProcessedFile {
        source: file_path.to_string(),
        csv_path,
        key: series.file_name,
        rows: series.records.len(),
        uploaded,
    })
}
