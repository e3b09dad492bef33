//! Exchange credentials from a JSON credentials file.
//!
//! The file holds `{"username": …, "password": …, "app_key": …}`. At
//! startup, [`populate_env_from_file`] copies any of these that are not
//! already in the environment into the `BETFAIR_*` variables so the
//! existing config flow picks them up transparently.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::error::OddsError;

/// Environment variable naming the credentials file.
pub const CREDENTIALS_PATH_VAR: &str = "BETFAIR_CREDENTIALS_PATH";

/// Contents of the credentials file. Secrets are wiped on drop.
#[derive(Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: Zeroizing<String>,
    pub app_key: Zeroizing<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("app_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    /// `(env var, value)` pairs in the order they are exported.
    fn env_pairs(&self) -> [(&'static str, &str); 3] {
        [
            ("BETFAIR_USERNAME", self.username.as_str()),
            ("BETFAIR_PASSWORD", self.password.as_str()),
            ("BETFAIR_APP_KEY", self.app_key.as_str()),
        ]
    }
}

/// Reads and validates a credentials file.
///
/// # Errors
///
/// Returns [`OddsError::Credentials`] if the file cannot be read, is not
/// valid JSON, or has an empty field.
pub fn load_credentials_file(path: &Path) -> crate::Result<Credentials> {
    let raw = Zeroizing::new(std::fs::read_to_string(path).map_err(|e| {
        OddsError::Credentials(format!("cannot read {}: {e}", path.display()))
    })?);
    let credentials: Credentials = serde_json::from_str(&raw).map_err(|e| {
        OddsError::Credentials(format!("invalid credentials file {}: {e}", path.display()))
    })?;

    for (name, value) in credentials.env_pairs() {
        if value.is_empty() {
            return Err(OddsError::Credentials(format!(
                "credentials file {} has an empty value for {name}",
                path.display()
            )));
        }
    }

    Ok(credentials)
}

/// Populates environment variables from the credentials file for any
/// credentials not already set in the environment.
///
/// Call this at startup before [`crate::config::fetch_config`].
pub fn populate_env_from_file(path: &Path) -> crate::Result<()> {
    let credentials = load_credentials_file(path)?;
    for (name, value) in credentials.env_pairs() {
        if std::env::var(name).is_err() {
            debug!(key = name, "loaded credential from file");
            // SAFETY: single-threaded at this point (before the runtime starts tasks)
            unsafe {
                std::env::set_var(name, value);
            }
        }
    }
    Ok(())
}
