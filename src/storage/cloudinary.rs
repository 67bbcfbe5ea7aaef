//! Managed media service (Cloudinary upload API).

use std::collections::BTreeMap;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use super::{UploadError, UploadProvider};
use crate::config::StorageSettings;

const PROVIDER: &str = "cloudinary";
const API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Credentials resolved from either the composite URL or the split fields.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    cloud_name: String,
    api_key: String,
    api_secret: String,
}

impl Credentials {
    /// `Ok(None)` when nothing is configured. A URL that is present but
    /// unusable is a failure, not a reason to fall back.
    fn from_settings(settings: &StorageSettings) -> Result<Option<Self>, UploadError> {
        if let Some(url) = settings.cloudinary_url.as_deref() {
            return Self::parse_url(url).map(Some).ok_or_else(|| {
                UploadError::failed(
                    PROVIDER,
                    "CLOUDINARY_URL must look like cloudinary://<key>:<secret>@<cloud>",
                )
            });
        }

        let (Some(cloud_name), Some(api_key), Some(api_secret)) = (
            settings.cloudinary_cloud_name.clone(),
            settings.cloudinary_api_key.clone(),
            settings.cloudinary_api_secret.clone(),
        ) else {
            return Ok(None);
        };
        Ok(Some(Self {
            cloud_name,
            api_key,
            api_secret,
        }))
    }

    /// Parse `cloudinary://<api_key>:<api_secret>@<cloud_name>`.
    fn parse_url(raw: &str) -> Option<Self> {
        let url = url::Url::parse(raw).ok()?;
        if url.scheme() != "cloudinary" {
            return None;
        }
        let api_key = urlencoding::decode(url.username()).ok()?.into_owned();
        let api_secret = urlencoding::decode(url.password()?).ok()?.into_owned();
        let cloud_name = url.host_str()?.to_string();
        if api_key.is_empty() || api_secret.is_empty() || cloud_name.is_empty() {
            return None;
        }
        Some(Self {
            cloud_name,
            api_key,
            api_secret,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Sign upload parameters: sorted `k=v` pairs joined by `&`, secret appended, SHA-1 hex.
fn sign(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Uploads PDFs as public raw resources.
pub struct CloudinaryProvider {
    settings: StorageSettings,
    client: reqwest::Client,
}

impl CloudinaryProvider {
    pub fn new(settings: StorageSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    fn upload_params(&self, object_name: &str, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("access_mode", "public".to_string());
        params.insert("folder", self.settings.media_folder().to_string());
        params.insert("overwrite", "true".to_string());
        params.insert("public_id", object_name.to_string());
        params.insert("timestamp", timestamp.to_string());
        params.insert("type", "upload".to_string());
        params.insert("unique_filename", "false".to_string());
        params.insert("use_filename", "true".to_string());
        params
    }
}

#[async_trait]
impl UploadProvider for CloudinaryProvider {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError> {
        let creds = Credentials::from_settings(&self.settings)?
            .ok_or(UploadError::NotConfigured(PROVIDER))?;

        let params = self.upload_params(object_name, chrono::Utc::now().timestamp());
        let signature = sign(&params, &creds.api_secret);

        let file = Part::bytes(data.to_vec())
            .file_name(object_name.to_string())
            .mime_str("application/pdf")
            .map_err(|e| UploadError::failed(PROVIDER, e))?;

        let mut form = Form::new()
            .text("api_key", creds.api_key.clone())
            .text("signature", signature)
            .part("file", file);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let endpoint = format!("{}/{}/raw/upload", API_BASE, creds.cloud_name);
        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::failed(PROVIDER, e))?;

        let status = response.status();
        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| UploadError::failed(PROVIDER, format!("HTTP {}: {}", status, e)))?;

        if let Some(error) = body.error {
            return Err(UploadError::failed(
                PROVIDER,
                format!("HTTP {}: {}", status, error.message),
            ));
        }
        if !status.is_success() {
            return Err(UploadError::failed(PROVIDER, format!("HTTP {}", status)));
        }

        body.secure_url
            .or(body.url)
            .ok_or_else(|| UploadError::failed(PROVIDER, "response carried no URL"))
    }
}
