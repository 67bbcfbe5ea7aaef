//! S3-compatible object storage.

use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};

use super::{UploadError, UploadProvider};
use crate::config::StorageSettings;

const PROVIDER: &str = "object-storage";

/// Uploads to a bucket with content type `application/pdf`.
pub struct ObjectStorageProvider {
    settings: StorageSettings,
}

impl ObjectStorageProvider {
    pub fn new(settings: StorageSettings) -> Self {
        Self { settings }
    }

    /// Public URL of an object.
    pub fn object_url(&self, bucket: &str, object_name: &str) -> String {
        match self.settings.aws_endpoint_url.as_deref() {
            Some(endpoint) => format!(
                "{}/{}/{}",
                endpoint.trim_end_matches('/'),
                bucket,
                object_name
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{}",
                bucket,
                self.settings.region(),
                object_name
            ),
        }
    }

    fn build_store(&self, bucket: &str) -> Result<impl ObjectStore, UploadError> {
        let (Some(key_id), Some(secret)) = (
            self.settings.aws_access_key_id.as_deref(),
            self.settings.aws_secret_access_key.as_deref(),
        ) else {
            return Err(UploadError::NotConfigured(PROVIDER));
        };

        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(bucket)
            .with_region(self.settings.region())
            .with_access_key_id(key_id)
            .with_secret_access_key(secret);

        if let Some(endpoint) = self.settings.aws_endpoint_url.as_deref() {
            builder = builder
                .with_endpoint(endpoint)
                .with_allow_http(endpoint.starts_with("http://"))
                .with_virtual_hosted_style_request(false);
        }

        // Credentials were checked above; anything the builder rejects now is
        // broken configuration.
        builder.build().map_err(|e| UploadError::failed(PROVIDER, e))
    }
}

#[async_trait]
impl UploadProvider for ObjectStorageProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError> {
        if !self.settings.object_storage_configured() {
            return Err(UploadError::NotConfigured(PROVIDER));
        }
        let Some(bucket) = self.settings.aws_bucket.clone() else {
            tracing::warn!("Object storage credentials set but no bucket name; skipping");
            return Err(UploadError::MissingCredentials {
                provider: PROVIDER,
                message: "no bucket configured".to_string(),
            });
        };

        let store = self.build_store(&bucket)?;

        let mut attributes = Attributes::new();
        attributes.insert(Attribute::ContentType, "application/pdf".into());
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let path = ObjectPath::from(object_name);
        match store.put_opts(&path, PutPayload::from(data), options).await {
            Ok(_) => Ok(self.object_url(&bucket, object_name)),
            Err(object_store::Error::Unauthenticated { source, .. }) => {
                tracing::warn!("Object storage rejected credentials: {}", source);
                Err(UploadError::MissingCredentials {
                    provider: PROVIDER,
                    message: source.to_string(),
                })
            }
            Err(e) => Err(UploadError::failed(PROVIDER, e)),
        }
    }
}
