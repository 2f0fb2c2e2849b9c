use crate::{
    config::ObjectStoreConfig,
    error::{GenImageError, Result},
    storage::traits::{ArtifactWriter, ObjectStoreConnector},
};
use async_trait::async_trait;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
    Client,
};
use std::sync::Arc;

/// Connects to S3 or any S3-compatible server such as MinIO.
#[derive(Debug, Clone, Copy, Default)]
pub struct S3Connector;

impl S3Connector {
    async fn build_client(config: &ObjectStoreConfig) -> Result<Client> {
        let (Some(endpoint), Some(access_key), Some(secret_key)) = (
            config.endpoint_url(),
            config.access_key.as_deref(),
            config.secret_key.as_deref(),
        ) else {
            return Err(GenImageError::ObjectStoreInitError(
                "endpoint, access key and secret key are required".into(),
            ));
        };

        let shared = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "rgenimg-static",
            ))
            .region(Region::new(config.region().to_string()))
            .endpoint_url(endpoint)
            .load()
            .await;

        // MinIO and most self-hosted servers only speak path-style addressing.
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(true)
            .build();

        Ok(Client::from_conf(s3_config))
    }

    async fn ensure_bucket(client: &Client, bucket: &str) -> Result<()> {
        match client.head_bucket().bucket(bucket).send().await {
            Ok(_) => {
                log::debug!("Bucket {} exists", bucket);
                Ok(())
            }
            Err(e) if e.as_service_error().map_or(false, |se| se.is_not_found()) => {
                log::info!("Creating bucket {}", bucket);
                client
                    .create_bucket()
                    .bucket(bucket)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(|e| {
                        GenImageError::ObjectStoreInitError(format!(
                            "cannot create bucket {}: {}",
                            bucket,
                            DisplayErrorContext(&e)
                        ))
                    })
            }
            Err(e) => Err(GenImageError::ObjectStoreInitError(format!(
                "cannot reach bucket {}: {}",
                bucket,
                DisplayErrorContext(&e)
            ))),
        }
    }
}

#[async_trait]
impl ObjectStoreConnector for S3Connector {
    async fn connect(&self, config: &ObjectStoreConfig) -> Result<Arc<dyn ArtifactWriter>> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| GenImageError::ObjectStoreInitError("bucket name is required".into()))?;

        let client = Self::build_client(config).await?;
        Self::ensure_bucket(&client, &bucket).await?;

        Ok(Arc::new(S3Writer { client, bucket }))
    }
}

pub struct S3Writer {
    client: Client,
    bucket: String,
}

#[async_trait]
impl ArtifactWriter for S3Writer {
    async fn write(&self, key: &str, bytes: &[u8], content_type: &str) -> Result<String> {
        // Single PutObject with the full length declared up front.
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .content_length(bytes.len() as i64)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await
            .map_err(|e| {
                GenImageError::ObjectStoreWriteError(format!(
                    "upload of {} failed: {}",
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;

        log::info!("Saved to S3: {}/{}", self.bucket, key);
        Ok(key.to_string())
    }

    fn describe(&self) -> String {
        format!("bucket {}", self.bucket)
    }
}
