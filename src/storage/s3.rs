//! S3 object store on the AWS SDK, path-style with static keys.

use aws_sdk_s3::Client;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use reqwest::Url;
use tracing::debug;

use super::ObjectStore;
use crate::Result;
use crate::config::StorageConfig;
use crate::error::OddsError;

/// Name the static credentials are reported under by the SDK.
const CREDENTIALS_PROVIDER: &str = "odds-history";

/// Path-style S3 client (`{endpoint}/{bucket}/{key}`).
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
}

impl S3Store {
    /// Builds a store from the storage configuration.
    ///
    /// Without `S3_ENDPOINT` the SDK resolves the regional AWS endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`OddsError::Config`] if the AWS keys are absent or the
    /// endpoint is not a valid URL.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        else {
            return Err(OddsError::Config(
                "S3 storage needs AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY".into(),
            ));
        };

        let credentials = Credentials::new(
            access_key_id.clone(),
            secret_access_key.clone(),
            config.session_token.clone(),
            None,
            CREDENTIALS_PROVIDER,
        );
        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .force_path_style(true)
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.endpoint {
            let url = Url::parse(endpoint)
                .map_err(|e| OddsError::Config(format!("invalid S3 endpoint {endpoint:?}: {e}")))?;
            builder = builder.endpoint_url(url.as_str().trim_end_matches('/'));
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }
}

fn sdk_error<E: std::error::Error>(action: &str, bucket: &str, key: &str, err: E) -> OddsError {
    OddsError::Storage(format!(
        "{action} s3://{bucket}/{key} failed: {}",
        DisplayErrorContext(err)
    ))
}

impl ObjectStore for S3Store {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| sdk_error("GET", bucket, key, e))?;
        let body = response
            .body
            .collect()
            .await
            .map_err(|e| sdk_error("GET", bucket, key, e))?
            .into_bytes();

        debug!(bucket, key, bytes = body.len(), "Fetched object");
        Ok(body.to_vec())
    }

    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        let size = body.len();
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type("text/csv")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| sdk_error("PUT", bucket, key, e))?;

        debug!(bucket, key, bytes = size, "Stored object");
        Ok(())
    }
}
