//! Object storage for odds tables.
//!
//! The store is a byte-addressed key-value service: read or write an
//! object by bucket and key. [`read_odds_csv`] and [`write_odds_csv`] sit
//! on top of it and translate between stored bytes and odds rows.

pub mod local;
pub mod s3;

use std::future::Future;

pub use local::LocalStore;
pub use s3::S3Store;

use crate::Result;
use crate::error::OddsError;
use crate::series::OddsRecord;
use crate::table;

/// Read/write access to objects by bucket and key.
pub trait ObjectStore {
    /// Returns the full contents of an object.
    fn get_object(&self, bucket: &str, key: &str) -> impl Future<Output = Result<Vec<u8>>> + Send;

    /// Creates or replaces an object.
    fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Fetches a stored odds table and parses it.
///
/// # Errors
///
/// Returns the store's error if the object cannot be read,
/// [`OddsError::Storage`] if it is not UTF-8, and
/// [`OddsError::Csv`] if it is not a valid odds table.
pub async fn read_odds_csv<S: ObjectStore>(
    store: &S,
    bucket: &str,
    key: &str,
) -> Result<Vec<OddsRecord>> {
    let bytes = store.get_object(bucket, key).await?;
    let text = String::from_utf8(bytes)
        .map_err(|e| OddsError::Storage(format!("{bucket}/{key} is not UTF-8: {e}")))?;
    table::read_csv(text.as_bytes())
}

/// Encodes `records` as CSV and stores them under `key`.
pub async fn write_odds_csv<S: ObjectStore>(
    store: &S,
    bucket: &str,
    key: &str,
    records: &[OddsRecord],
) -> Result<()> {
    let body = table::to_csv_bytes(records)?;
    store.put_object(bucket, key, body).await
}
