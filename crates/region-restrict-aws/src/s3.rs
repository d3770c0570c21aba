//! Bucket policies on S3

use async_trait::async_trait;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::Client;
use region_restrict::{Error, PolicyStore, Result};
use tracing::debug;

/// Error code S3 returns when a bucket has no policy attached
pub const NO_SUCH_BUCKET_POLICY: &str = "NoSuchBucketPolicy";

/// [`PolicyStore`] backed by the S3 bucket policy API
#[derive(Clone, Debug)]
pub struct S3PolicyStore {
    client: Client,
}

impl S3PolicyStore {
    pub fn new(client: Client) -> Self {
        S3PolicyStore { client }
    }
}

#[async_trait]
impl PolicyStore for S3PolicyStore {
    async fn get_policy(&self, bucket: &str) -> Result<Option<String>> {
        match self.client.get_bucket_policy().bucket(bucket).send().await {
            Ok(output) => Ok(output.policy().map(str::to_string)),
            Err(err) => {
                let code = err.as_service_error().and_then(|e| e.code());
                if code == Some(NO_SUCH_BUCKET_POLICY) {
                    debug!("Bucket {} has no policy", bucket);
                    return Ok(None);
                }
                Err(Error::storage(
                    bucket,
                    "GetBucketPolicy",
                    DisplayErrorContext(&err).to_string(),
                ))
            }
        }
    }

    async fn put_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map_err(|e| {
                Error::storage(bucket, "PutBucketPolicy", DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }

    async fn delete_policy(&self, bucket: &str) -> Result<()> {
        self.client
            .delete_bucket_policy()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| {
                Error::storage(
                    bucket,
                    "DeleteBucketPolicy",
                    DisplayErrorContext(&e).to_string(),
                )
            })?;
        Ok(())
    }
}
