//! Application configuration loaded from environment variables.
//!
//! Exchange credentials **must** be provided via environment variables
//! (or a credentials file, see [`crate::credentials`]):
//! - `BETFAIR_USERNAME`, `BETFAIR_PASSWORD`, `BETFAIR_APP_KEY`
//! - `BETFAIR_CERT_PATH`, `BETFAIR_KEY_PATH`: PEM client certificate and key
//!
//! The object-storage bucket comes from `ODDS_BUCKET`. AWS keys are
//! optional; without them the pipeline keeps tables on local disk only.
//! The download filter (`ODDS_*`) defaults to Spanish match-odds markets
//! for November 2024 on the basic plan.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::error::OddsError;
use crate::historic::FileFilter;

/// Default certificate-login endpoint.
const DEFAULT_LOGIN_URL: &str = "https://identitysso-cert.betfair.com";
/// Default session endpoint (logout).
const DEFAULT_SESSION_URL: &str = "https://identitysso.betfair.com";
/// Default historic-data service.
const DEFAULT_HISTORIC_URL: &str = "https://historicdata.betfair.com";
const DEFAULT_REGION: &str = "eu-west-2";
const DEFAULT_SPORT: &str = "Soccer";
const DEFAULT_PLAN: &str = "Basic Plan";
const DEFAULT_FROM: &str = "2024-11-01";
const DEFAULT_TO: &str = "2024-12-01";
const DEFAULT_MARKET_TYPES: &str = "MATCH_ODDS";
const DEFAULT_COUNTRIES: &str = "ES";
const DEFAULT_WORK_DIR: &str = "data";

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub betfair: BetfairConfig,
    pub storage: StorageConfig,
    pub download: DownloadConfig,
}

/// Exchange account and endpoint settings.
#[derive(Debug, Clone)]
pub struct BetfairConfig {
    pub username: String,
    pub password: String,
    pub app_key: String,
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    pub login_url: String,
    pub session_url: String,
    pub historic_url: String,
}

/// Object-storage settings.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    pub region: String,
    /// Overrides `https://s3.<region>.amazonaws.com`.
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
}

impl StorageConfig {
    /// Whether upload credentials are configured.
    pub fn has_credentials(&self) -> bool {
        self.access_key_id.is_some() && self.secret_access_key.is_some()
    }
}

/// What to download and where to keep it.
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub filter: FileFilter,
    pub work_dir: PathBuf,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`OddsError::Config`] if a required variable is missing, a date
/// cannot be parsed, or only one of the two AWS key variables is set.
pub fn fetch_config() -> crate::Result<AppConfig> {
    Ok(AppConfig {
        betfair: fetch_betfair_config()?,
        storage: fetch_storage_config()?,
        download: fetch_download_config()?,
    })
}

/// Loads only the exchange settings.
pub fn fetch_betfair_config() -> crate::Result<BetfairConfig> {
    Ok(BetfairConfig {
        username: required_var("BETFAIR_USERNAME")?,
        password: required_var("BETFAIR_PASSWORD")?,
        app_key: required_var("BETFAIR_APP_KEY")?,
        cert_path: PathBuf::from(required_var("BETFAIR_CERT_PATH")?),
        key_path: PathBuf::from(required_var("BETFAIR_KEY_PATH")?),
        login_url: var_or("BETFAIR_LOGIN_URL", DEFAULT_LOGIN_URL),
        session_url: var_or("BETFAIR_SESSION_URL", DEFAULT_SESSION_URL),
        historic_url: var_or("BETFAIR_HISTORIC_URL", DEFAULT_HISTORIC_URL),
    })
}

/// Loads only the object-storage settings.
pub fn fetch_storage_config() -> crate::Result<StorageConfig> {
    let access_key_id = non_empty_var("AWS_ACCESS_KEY_ID");
    let secret_access_key = non_empty_var("AWS_SECRET_ACCESS_KEY");

    match (&access_key_id, &secret_access_key) {
        (Some(_), None) => {
            return Err(OddsError::Config(
                "AWS_ACCESS_KEY_ID is set but AWS_SECRET_ACCESS_KEY is missing".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(OddsError::Config(
                "AWS_SECRET_ACCESS_KEY is set but AWS_ACCESS_KEY_ID is missing".to_string(),
            ));
        }
        _ => {}
    }

    Ok(StorageConfig {
        bucket: required_var("ODDS_BUCKET")?,
        region: var_or("AWS_REGION", DEFAULT_REGION),
        endpoint: non_empty_var("S3_ENDPOINT"),
        access_key_id,
        secret_access_key,
        session_token: non_empty_var("AWS_SESSION_TOKEN"),
    })
}

/// Loads only the download filter and work directory.
pub fn fetch_download_config() -> crate::Result<DownloadConfig> {
    let from = parse_date("ODDS_FROM", &var_or("ODDS_FROM", DEFAULT_FROM))?;
    let to = parse_date("ODDS_TO", &var_or("ODDS_TO", DEFAULT_TO))?;
    if to < from {
        return Err(OddsError::Config(format!(
            "ODDS_TO ({to}) is before ODDS_FROM ({from})"
        )));
    }

    Ok(DownloadConfig {
        filter: FileFilter {
            sport: var_or("ODDS_SPORT", DEFAULT_SPORT),
            plan: var_or("ODDS_PLAN", DEFAULT_PLAN),
            from,
            to,
            market_types: list_var("ODDS_MARKET_TYPES", DEFAULT_MARKET_TYPES),
            countries: list_var("ODDS_COUNTRIES", DEFAULT_COUNTRIES),
        },
        work_dir: PathBuf::from(var_or("ODDS_WORK_DIR", DEFAULT_WORK_DIR)),
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn var_or(name: &str, default: &str) -> String {
    non_empty_var(name).unwrap_or_else(|| default.to_string())
}

fn required_var(name: &str) -> crate::Result<String> {
    non_empty_var(name).ok_or_else(|| OddsError::Config(format!("{name} is not set")))
}

/// Splits a comma-separated variable, dropping blanks.
fn list_var(name: &str, default: &str) -> Vec<String> {
    var_or(name, default)
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_date(name: &str, value: &str) -> crate::Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| OddsError::Config(format!("{name}={value:?} is not a YYYY-MM-DD date: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Serializes env mutation across the tests in this module.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    /// Helper that temporarily sets env vars, runs `f`, then restores originals.
    ///
    /// # Safety
    ///
    /// Holds [`ENV_LOCK`] for the duration; no other code in the test binary
    /// mutates these variables.
    fn with_env<F: FnOnce()>(vars: &[(&str, Option<&str>)], f: F) {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let originals: Vec<(&str, Option<String>)> = vars
            .iter()
            .map(|(k, _)| (*k, std::env::var(k).ok()))
            .collect();

        for (k, v) in vars {
            // SAFETY: ENV_LOCK is held, no concurrent env access in these tests.
            unsafe {
                match v {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }

        f();

        for (k, original) in originals {
            // SAFETY: restoring original values, same single-threaded context.
            unsafe {
                match original {
                    Some(val) => std::env::set_var(k, val),
                    None => std::env::remove_var(k),
                }
            }
        }
    }

    const BETFAIR_VARS: [(&str, Option<&str>); 5] = [
        ("BETFAIR_USERNAME", Some("punter")),
        ("BETFAIR_PASSWORD", Some("hunter2")),
        ("BETFAIR_APP_KEY", Some("app-key")),
        ("BETFAIR_CERT_PATH", Some("certs/client.crt")),
        ("BETFAIR_KEY_PATH", Some("certs/client.key")),
    ];

    #[test]
    fn betfair_defaults_endpoints() {
        let mut vars = BETFAIR_VARS.to_vec();
        vars.push(("BETFAIR_LOGIN_URL", None));
        vars.push(("BETFAIR_HISTORIC_URL", None));
        with_env(&vars, || {
            let config = fetch_betfair_config().unwrap();
            assert_eq!(config.username, "punter");
            assert_eq!(config.app_key, "app-key");
            assert_eq!(config.login_url, DEFAULT_LOGIN_URL);
            assert_eq!(config.historic_url, DEFAULT_HISTORIC_URL);
            assert_eq!(config.key_path, PathBuf::from("certs/client.key"));
        });
    }

    #[test]
    fn betfair_requires_app_key() {
        let mut vars = BETFAIR_VARS.to_vec();
        vars[2] = ("BETFAIR_APP_KEY", Some(""));
        with_env(&vars, || {
            let err = fetch_betfair_config().unwrap_err();
            assert!(err.to_string().contains("BETFAIR_APP_KEY is not set"));
        });
    }

    #[test]
    fn storage_without_keys_disables_upload() {
        with_env(
            &[
                ("ODDS_BUCKET", Some("betfairex")),
                ("AWS_REGION", None),
                ("AWS_ACCESS_KEY_ID", None),
                ("AWS_SECRET_ACCESS_KEY", None),
                ("S3_ENDPOINT", None),
            ],
            || {
                let config = fetch_storage_config().unwrap();
                assert_eq!(config.bucket, "betfairex");
                assert_eq!(config.region, DEFAULT_REGION);
                assert!(!config.has_credentials());
                assert!(config.endpoint.is_none());
            },
        );
    }

    #[test]
    fn storage_rejects_key_without_secret() {
        with_env(
            &[
                ("ODDS_BUCKET", Some("betfairex")),
                ("AWS_ACCESS_KEY_ID", Some("AKIA")),
                ("AWS_SECRET_ACCESS_KEY", None),
            ],
            || {
                let err = fetch_storage_config().unwrap_err();
                assert!(err.to_string().contains("AWS_SECRET_ACCESS_KEY is missing"));
            },
        );
    }

    #[test]
    fn download_defaults() {
        with_env(
            &[
                ("ODDS_FROM", None),
                ("ODDS_TO", None),
                ("ODDS_SPORT", None),
                ("ODDS_PLAN", None),
                ("ODDS_MARKET_TYPES", None),
                ("ODDS_COUNTRIES", None),
                ("ODDS_WORK_DIR", None),
            ],
            || {
                let config = fetch_download_config().unwrap();
                assert_eq!(config.filter.sport, "Soccer");
                assert_eq!(config.filter.plan, "Basic Plan");
                assert_eq!(config.filter.from, NaiveDate::from_ymd_opt(2024, 11, 1).unwrap());
                assert_eq!(config.filter.to, NaiveDate::from_ymd_opt(2024, 12, 1).unwrap());
                assert_eq!(config.filter.market_types, vec!["MATCH_ODDS"]);
                assert_eq!(config.filter.countries, vec!["ES"]);
                assert_eq!(config.work_dir, PathBuf::from("data"));
            },
        );
    }

    #[test]
    fn download_parses_lists_and_dates() {
        with_env(
            &[
                ("ODDS_FROM", Some("2024-01-04")),
                ("ODDS_TO", Some("2024-01-31")),
                ("ODDS_COUNTRIES", Some("ES, GB,,IT")),
            ],
            || {
                let config = fetch_download_config().unwrap();
                assert_eq!(config.filter.from, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
                assert_eq!(config.filter.countries, vec!["ES", "GB", "IT"]);
            },
        );
    }

    #[test]
    fn download_rejects_bad_dates() {
        with_env(&[("ODDS_FROM", Some("04/01/2024")), ("ODDS_TO", None)], || {
            let err = fetch_download_config().unwrap_err();
            assert!(err.to_string().contains("ODDS_FROM"));
        });

        with_env(
            &[("ODDS_FROM", Some("2024-02-01")), ("ODDS_TO", Some("2024-01-01"))],
            || {
                let err = fetch_download_config().unwrap_err();
                assert!(err.to_string().contains("before"));
            },
        );
    }
}
