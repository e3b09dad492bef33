//! Batch runs against canned archive files and a directory-backed store.

mod common;

use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use odds_history::OddsError;
use odds_history::config::DownloadConfig;
use odds_history::historic::FileFilter;
use odds_history::parser::parse_market;
use odds_history::pipeline::{export_series, process_compressed_file, run};
use odds_history::series::build_series_in;
use odds_history::storage::{LocalStore, read_odds_csv};

use common::{FixtureSource, OVER_UNDER, REAL_MADRID_V_BARCELONA, UNKNOWN_SELECTION, compress};

const BUCKET: &str = "betfairex";
const CLASICO: &str = "/xds_nfs/edp_processed/BASIC/2024/Nov/1/33712893/1.234567.bz2";

fn download_config(work_dir: PathBuf) -> DownloadConfig {
    DownloadConfig {
        filter: FileFilter {
            sport: "Soccer".into(),
            plan: "Basic Plan".into(),
            from: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
            market_types: vec!["MATCH_ODDS".into()],
            countries: vec!["ES".into()],
        },
        work_dir,
    }
}

#[tokio::test]
async fn failed_files_do_not_stop_the_run() {
    let work = tempfile::tempdir().unwrap();
    let bucket_root = tempfile::tempdir().unwrap();
    let store = LocalStore::new(bucket_root.path());

    let source = FixtureSource::new()
        .with_market(CLASICO, REAL_MADRID_V_BARCELONA)
        .with_market("/BASIC/2024/Jan/4/1.998877.bz2", UNKNOWN_SELECTION)
        .with_market("/BASIC/2024/Nov/1/1.111111.bz2", OVER_UNDER)
        .with_raw("/BASIC/2024/Nov/2/1.222222.bz2", b"not a bzip2 stream".to_vec());

    let config = download_config(work.path().join("data"));
    let report = run(&source, Some((&store, BUCKET)), &config).await.unwrap();

    assert_eq!(report.processed.len(), 1);
    assert_eq!(report.failed.len(), 3);
    assert_eq!(report.total_rows(), 7);

    let processed = &report.processed[0];
    assert_eq!(processed.source, CLASICO);
    assert_eq!(processed.key, "2024-11-01_Real Madrid v Barcelona.csv");
    assert!(processed.uploaded);
    assert!(processed.csv_path.exists());
    assert!(config.work_dir.join("1.234567.bz2.decompressed").exists());

    assert!(matches!(report.failed[0].error, OddsError::UnknownSelection(40)));
    assert!(matches!(
        report.failed[1].error,
        OddsError::UnexpectedMarketType { .. }
    ));
    assert!(matches!(report.failed[2].error, OddsError::Decompress(_)));
}

#[tokio::test]
async fn uploaded_table_matches_local_series() {
    let work = tempfile::tempdir().unwrap();
    let bucket_root = tempfile::tempdir().unwrap();
    let store = LocalStore::new(bucket_root.path());

    let compressed = common::write_file(
        work.path(),
        "1.234567.bz2",
        &compress(REAL_MADRID_V_BARCELONA.as_bytes()),
    );
    let series = process_compressed_file(&compressed).unwrap();

    let (csv_path, uploaded) = export_series(&series, work.path(), Some((&store, BUCKET)))
        .await
        .unwrap();
    assert!(uploaded);
    assert_eq!(csv_path, work.path().join(&series.file_name));

    let stored = read_odds_csv(&store, BUCKET, &series.file_name).await.unwrap();
    assert_eq!(stored, series.records);

    let selections: Vec<&str> = stored.iter().map(|r| r.selection.as_str()).collect();
    assert_eq!(
        selections,
        vec!["Real Madrid", "Barcelona", "Draw", "Real Madrid", "Barcelona", "Draw", "Real Madrid"]
    );
    let inplay: Vec<bool> = stored.iter().map(|r| r.inplay).collect();
    assert_eq!(inplay, vec![false, false, false, true, true, true, true]);
}

#[tokio::test]
async fn runs_without_a_store() {
    let work = tempfile::tempdir().unwrap();
    let source = FixtureSource::new().with_market(CLASICO, REAL_MADRID_V_BARCELONA);

    let config = download_config(work.path().to_path_buf());
    let report = run(&source, None::<(&LocalStore, &str)>, &config).await.unwrap();

    assert_eq!(report.processed.len(), 1);
    assert!(!report.processed[0].uploaded);
    let local = std::fs::read_to_string(&report.processed[0].csv_path).unwrap();
    assert!(local.starts_with("timestamp,selection,odds,inplay\n"));
    assert_eq!(local.lines().count(), 8);
}

#[tokio::test]
async fn empty_listing_is_an_empty_report() {
    let work = tempfile::tempdir().unwrap();
    let config = download_config(work.path().to_path_buf());
    let report = run(&FixtureSource::new(), None::<(&LocalStore, &str)>, &config)
        .await
        .unwrap();
    assert!(report.processed.is_empty());
    assert!(report.failed.is_empty());
}

#[test]
fn missing_object_is_reported_by_store() {
    let bucket_root = tempfile::tempdir().unwrap();
    let store = LocalStore::new(bucket_root.path());
    let key = "2024-01-04_Sevilla v Athletic Bilbao.csv";
    let err = tokio_test::block_on(read_odds_csv(&store, BUCKET, key)).unwrap_err();
    assert!(matches!(err, OddsError::Storage(_)));
}

#[tokio::test]
async fn event_name_cannot_leave_work_dir() {
    let root = tempfile::tempdir().unwrap();
    let work = root.path().join("work");
    std::fs::create_dir(&work).unwrap();

    let stream = REAL_MADRID_V_BARCELONA.replacen(
        r#""eventName":"Real Madrid v Barcelona""#,
        r#""eventName":"x/../../escaped""#,
        1,
    );
    let parsed = parse_market(stream.as_bytes()).unwrap();
    let series = build_series_in(&parsed.definition, &parsed.changes, &Utc).unwrap();

    let (csv_path, _) = export_series(&series, &work, None::<(&LocalStore, &str)>)
        .await
        .unwrap();
    assert_eq!(csv_path.parent(), Some(work.as_path()));
    assert!(csv_path.exists());
    assert!(!root.path().join("escaped.csv").exists());
}
