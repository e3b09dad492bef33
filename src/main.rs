use std::path::PathBuf;

use odds_history::OddsError;
use odds_history::config::fetch_config;
use odds_history::credentials::{CREDENTIALS_PATH_VAR, populate_env_from_file};
use odds_history::historic::HistoricClient;
use odds_history::pipeline::run;
use odds_history::storage::S3Store;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), OddsError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Some(path) = std::env::var_os(CREDENTIALS_PATH_VAR) {
        populate_env_from_file(&PathBuf::from(path))?;
    }

    let app_config = fetch_config()?;

    let store = if app_config.storage.has_credentials() {
        Some(S3Store::from_config(&app_config.storage)?)
    } else {
        warn!("AWS credentials not set, odds tables stay on local disk");
        None
    };
    let bucket = app_config.storage.bucket.as_str();

    let client = HistoricClient::login(&app_config.betfair).await?;
    let outcome = run(
        &client,
        store.as_ref().map(|s| (s, bucket)),
        &app_config.download,
    )
    .await;

    if let Ok(report) = &outcome {
        for failed in &report.failed {
            warn!(source = failed.source, error = %failed.error, "Skipped market file");
        }
        info!(
            processed = report.processed.len(),
            failed = report.failed.len(),
            rows = report.total_rows(),
            "Done"
        );
    }

    if let Err(error) = client.logout().await {
        warn!(%error, "Logout failed, session left to expire");
    }

    outcome.map(|_| ())
}
