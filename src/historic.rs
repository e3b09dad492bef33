//! Historic-data provider client.
//!
//! [`HistoricClient`] is an explicit session handle: create it with
//! [`HistoricClient::login`] (certificate login), use it for any number of
//! [`list_files`](HistoricClient::list_files) and
//! [`fetch_file`](HistoricClient::fetch_file) calls, then dispose of
//! it with [`logout`](HistoricClient::logout). Nothing is retried; any
//! transport or status failure is returned to the caller.
//!
//! The pipeline only sees the [`MarketSource`] trait, so it can run
//! against local fixtures.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::Result;
use crate::config::BetfairConfig;
use crate::error::OddsError;
use crate::tls::{build_client_auth_config, build_tls_config};

/// File type code of market-level stream files.
const MARKET_FILE_TYPE: &str = "M";

/// Which archive files to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFilter {
    pub sport: String,
    pub plan: String,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub market_types: Vec<String>,
    pub countries: Vec<String>,
}

/// Request body of `DownloadListOfFiles`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FileListRequest<'a> {
    sport: &'a str,
    plan: &'a str,
    from_day: u32,
    from_month: u32,
    from_year: i32,
    to_day: u32,
    to_month: u32,
    to_year: i32,
    market_types_collection: &'a [String],
    countries_collection: &'a [String],
    file_type_collection: [&'static str; 1],
}

impl FileFilter {
    fn request(&self) -> FileListRequest<'_> {
        FileListRequest {
            sport: &self.sport,
            plan: &self.plan,
            from_day: self.from.day(),
            from_month: self.from.month(),
            from_year: self.from.year(),
            to_day: self.to.day(),
            to_month: self.to.month(),
            to_year: self.to.year(),
            market_types_collection: &self.market_types,
            countries_collection: &self.countries,
            file_type_collection: [MARKET_FILE_TYPE],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    session_token: Option<String>,
    login_status: String,
}

#[derive(Debug, Deserialize)]
struct LogoutResponse {
    status: String,
    #[serde(default)]
    error: Option<String>,
}

/// Anything that can list and fetch archived market files.
pub trait MarketSource {
    /// Lists the file paths matching `filter`.
    fn file_list(&self, filter: &FileFilter) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Stores the file at `file_path` inside `dir` and returns its local path.
    fn download_file(
        &self,
        file_path: &str,
        dir: &Path,
    ) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// An authenticated session with the historic-data service.
pub struct HistoricClient {
    http: reqwest::Client,
    app_key: String,
    session_token: Zeroizing<String>,
    historic_url: String,
    session_url: String,
}

impl std::fmt::Debug for HistoricClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoricClient")
            .field("historic_url", &self.historic_url)
            .finish_non_exhaustive()
    }
}

impl HistoricClient {
    /// Logs in with the account's client certificate.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Tls`] if the certificate cannot be loaded,
    /// [`OddsError::Http`] on transport or status failures, and
    /// [`OddsError::Provider`] if the login is rejected.
    pub async fn login(config: &BetfairConfig) -> Result<Self> {
        let tls = build_client_auth_config(&config.cert_path, &config.key_path)?;
        let http = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .build()
            .map_err(|e| OddsError::Tls(format!("failed to build HTTP client: {e}")))?;

        let url = format!("{}/api/certlogin", config.login_url.trim_end_matches('/'));
        let response = http
            .post(&url)
            .header("X-Application", &config.app_key)
            .header("Accept", "application/json")
            .form(&[
                ("username", config.username.as_str()),
                ("password", config.password.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?;

        let login: LoginResponse = response.json().await?;
        if login.login_status != "SUCCESS" {
            return Err(OddsError::Provider(format!(
                "login rejected: {}",
                login.login_status
            )));
        }
        let token = login.session_token.ok_or_else(|| {
            OddsError::Provider("login succeeded but no session token returned".into())
        })?;

        info!(username = config.username, "Logged in to historic data service");
        Ok(Self::with_http(http, config, token))
    }

    /// Wraps a session token obtained elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Tls`] if the HTTP client cannot be built.
    pub fn from_session(config: &BetfairConfig, session_token: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .use_preconfigured_tls(build_tls_config()?)
            .build()
            .map_err(|e| OddsError::Tls(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_http(http, config, session_token))
    }

    fn with_http(http: reqwest::Client, config: &BetfairConfig, session_token: String) -> Self {
        Self {
            http,
            app_key: config.app_key.clone(),
            session_token: Zeroizing::new(session_token),
            historic_url: config.historic_url.trim_end_matches('/').to_string(),
            session_url: config.session_url.trim_end_matches('/').to_string(),
        }
    }

    /// Lists the archive paths matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Http`] if the request fails or the response is
    /// not a JSON list of strings.
    pub async fn list_files(&self, filter: &FileFilter) -> Result<Vec<String>> {
        let url = format!("{}/api/DownloadListOfFiles", self.historic_url);
        let files: Vec<String> = self
            .http
            .post(&url)
            .header("ssoid", self.session_token.as_str())
            .json(&filter.request())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(
            sport = filter.sport,
            from = %filter.from,
            to = %filter.to,
            files = files.len(),
            "Listed historic files"
        );
        Ok(files)
    }

    /// Downloads one archive file into `dir`, streaming it to disk.
    ///
    /// The local file takes the last segment of `file_path` as its name.
    /// Returns the local path.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Provider`] for a path without a file name,
    /// [`OddsError::Http`] on transport or status failures, and
    /// [`OddsError::Io`] if writing the file fails.
    pub async fn fetch_file(&self, file_path: &str, dir: &Path) -> Result<PathBuf> {
        let target = dir.join(local_file_name(file_path)?);
        let url = format!("{}/api/DownloadFile", self.historic_url);

        let response = self
            .http
            .get(&url)
            .query(&[("filePath", file_path)])
            .header("ssoid", self.session_token.as_str())
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(&target).await?;
        let mut stream = response.bytes_stream();
        let mut size = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            size += chunk.len();
            file.write_all(&chunk).await?;
        }
        file.flush().await?;

        debug!(file_path, local = %target.display(), bytes = size, "Downloaded historic file");
        Ok(target)
    }

    /// Ends the session. The handle is consumed either way.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Http`] on transport or status failures and
    /// [`OddsError::Provider`] if the service reports a failed logout.
    pub async fn logout(self) -> Result<()> {
        let url = format!("{}/api/logout", self.session_url);
        let response: LogoutResponse = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header("X-Application", &self.app_key)
            .header("X-Authentication", self.session_token.as_str())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if response.status != "SUCCESS" {
            warn!(status = response.status, error = ?response.error, "Logout failed");
            return Err(OddsError::Provider(format!(
                "logout failed: {} {}",
                response.status,
                response.error.unwrap_or_default()
            )));
        }

        info!("Logged out of historic data service");
        Ok(())
    }
}

impl MarketSource for HistoricClient {
    async fn file_list(&self, filter: &FileFilter) -> Result<Vec<String>> {
        self.list_files(filter).await
    }

    async fn download_file(&self, file_path: &str, dir: &Path) -> Result<PathBuf> {
        self.fetch_file(file_path, dir).await
    }
}

/// Last path segment of a provider file path.
///
/// # Errors
///
/// Returns [`OddsError::Provider`] if the path ends in a separator or a
/// relative component.
pub fn local_file_name(file_path: &str) -> Result<&str> {
    file_path
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .ok_or_else(|| OddsError::Provider(format!("file path {file_path:?} has no file name")))
}
