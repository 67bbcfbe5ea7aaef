//! PDF storage backends.
//!
//! Uploads go through an ordered chain of providers: the managed media
//! service first, then S3-compatible object storage, then local disk. Each
//! provider either stores the bytes and returns a URL, or reports why it
//! could not; `UploadError::falls_through` decides whether the next provider
//! is tried.

mod cloudinary;
mod local;
mod s3;

use std::sync::OnceLock;

use async_trait::async_trait;
use bytes::Bytes;
use regex::Regex;
use thiserror::Error;

use crate::config::StorageSettings;

pub use cloudinary::CloudinaryProvider;
pub use local::LocalDiskProvider;
pub use s3::ObjectStorageProvider;

/// Longest object name accepted by every backend.
pub const MAX_OBJECT_NAME_LEN: usize = 255;

const FALLBACK_OBJECT_NAME: &str = "document.pdf";

/// Why a provider did not store a file.
#[derive(Debug, Error)]
pub enum UploadError {
    /// The backend has no configuration; try the next one.
    #[error("{0} is not configured")]
    NotConfigured(&'static str),
    /// The backend rejected or lacked credentials; try the next one.
    #[error("{provider}: missing or rejected credentials: {message}")]
    MissingCredentials {
        provider: &'static str,
        message: String,
    },
    /// The upload was attempted and failed; stop.
    #[error("{provider}: upload failed: {message}")]
    Failed {
        provider: &'static str,
        message: String,
    },
    /// Every provider declined.
    #[error("no storage backend accepted the upload")]
    Exhausted,
}

impl UploadError {
    /// True if the chain should continue with the next provider.
    pub fn falls_through(&self) -> bool {
        matches!(
            self,
            UploadError::NotConfigured(_) | UploadError::MissingCredentials { .. }
        )
    }

    pub(crate) fn failed(provider: &'static str, message: impl ToString) -> Self {
        UploadError::Failed {
            provider,
            message: message.to_string(),
        }
    }
}

/// One storage backend.
#[async_trait]
pub trait UploadProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Store `data` under `object_name` and return its public URL or path.
    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError>;
}

/// Anything that can take a PDF and return where it ended up.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError>;
}

/// Ordered provider list with stop/continue rules.
pub struct UploadChain {
    providers: Vec<Box<dyn UploadProvider>>,
}

impl UploadChain {
    pub fn new(providers: Vec<Box<dyn UploadProvider>>) -> Self {
        Self { providers }
    }

    /// Standard chain built from storage settings.
    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(vec![
            Box::new(CloudinaryProvider::new(settings.clone())),
            Box::new(ObjectStorageProvider::new(settings.clone())),
            Box::new(LocalDiskProvider::new(settings.local_dir.clone())),
        ])
    }

    /// Standard chain using settings overlaid with the current environment.
    pub fn current(settings: &StorageSettings) -> Self {
        Self::from_settings(&settings.with_env_overrides())
    }
}

#[async_trait]
impl Uploader for UploadChain {
    async fn upload(&self, data: Bytes, object_name: &str) -> Result<String, UploadError> {
        let object_name = sanitize_object_name(object_name);

        for provider in &self.providers {
            match provider.upload(data.clone(), &object_name).await {
                Ok(url) => {
                    tracing::info!(provider = provider.name(), %url, "Stored {}", object_name);
                    return Ok(url);
                }
                Err(e) if e.falls_through() => {
                    tracing::debug!("Skipping {}: {}", provider.name(), e);
                }
                Err(e) => {
                    tracing::error!("Upload of {} failed: {}", object_name, e);
                    return Err(e);
                }
            }
        }

        Err(UploadError::Exhausted)
    }
}

fn disallowed_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_.\-]").expect("valid regex"))
}

/// Reduce an arbitrary name to a safe flat object name.
///
/// Path separators become underscores, only `[A-Za-z0-9._-]` survive, `..`
/// sequences and leading/trailing dots or underscores are removed, and the
/// result is capped at 255 characters with the extension kept.
pub fn sanitize_object_name(name: &str) -> String {
    let spaced = name.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");
    let mut cleaned = disallowed_chars().replace_all(&joined, "").into_owned();

    loop {
        let trimmed = cleaned.trim_matches(|c| c == '.' || c == '_');
        let next = trimmed.replace("..", ".");
        if next == cleaned {
            break;
        }
        cleaned = next;
    }

    if cleaned.is_empty() {
        return FALLBACK_OBJECT_NAME.to_string();
    }

    if cleaned.len() > MAX_OBJECT_NAME_LEN {
        // Only ASCII remains, so byte slicing is safe.
        cleaned = match cleaned.rfind('.') {
            Some(dot) if cleaned.len() - dot < 16 => {
                let ext = cleaned[dot..].to_string();
                let stem_len = MAX_OBJECT_NAME_LEN - ext.len();
                format!("{}{}", &cleaned[..stem_len.min(dot)], ext)
            }
            _ => cleaned[..MAX_OBJECT_NAME_LEN].to_string(),
        };
    }

    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_sanitize_traversal() {
        let name = sanitize_object_name("../../etc/passwd.pdf");
        assert_eq!(name, "etc_passwd.pdf");
        assert!(!name.contains(".."));
        assert!(!name.contains('/'));
    }

    #[test]
    fn test_sanitize_keeps_tower_codes() {
        assert_eq!(sanitize_object_name("MP-30_1.0.pdf"), "MP-30_1.0.pdf");
        assert_eq!(sanitize_object_name("My Tower v2.pdf"), "My_Tower_v2.pdf");
        assert_eq!(sanitize_object_name("a\\b\\c.pdf"), "a_b_c.pdf");
        assert_eq!(sanitize_object_name("tour-é$.pdf"), "tour-.pdf");
    }

    #[test]
    fn test_sanitize_degenerate_names() {
        assert_eq!(sanitize_object_name(""), FALLBACK_OBJECT_NAME);
        assert_eq!(sanitize_object_name("../.."), FALLBACK_OBJECT_NAME);
        assert_eq!(sanitize_object_name("a....pdf"), "a.pdf");
    }

    #[test]
    fn test_sanitize_truncates_keeping_extension() {
        let long = format!("{}.pdf", "x".repeat(400));
        let name = sanitize_object_name(&long);
        assert_eq!(name.len(), MAX_OBJECT_NAME_LEN);
        assert!(name.ends_with(".pdf"));
    }

    enum Outcome {
        NotConfigured,
        MissingCredentials,
        Failed,
        Stored(&'static str),
    }

    struct FakeProvider {
        outcome: Outcome,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl UploadProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn upload(&self, _data: Bytes, _name: &str) -> Result<String, UploadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.outcome {
                Outcome::NotConfigured => Err(UploadError::NotConfigured("fake")),
                Outcome::MissingCredentials => Err(UploadError::MissingCredentials {
                    provider: "fake",
                    message: "no credentials".to_string(),
                }),
                Outcome::Failed => Err(UploadError::failed("fake", "boom")),
                Outcome::Stored(url) => Ok(url.to_string()),
            }
        }
    }

    fn chain(outcomes: Vec<Outcome>) -> (UploadChain, Vec<Arc<AtomicUsize>>) {
        let mut counters = Vec::new();
        let providers = outcomes
            .into_iter()
            .map(|outcome| {
                let calls = Arc::new(AtomicUsize::new(0));
                counters.push(calls.clone());
                Box::new(FakeProvider { outcome, calls }) as Box<dyn UploadProvider>
            })
            .collect();
        (UploadChain::new(providers), counters)
    }

    #[tokio::test]
    async fn test_chain_falls_through_to_next_provider() {
        let (chain, calls) = chain(vec![
            Outcome::NotConfigured,
            Outcome::MissingCredentials,
            Outcome::Stored("/uploads/a.pdf"),
        ]);
        let url = chain.upload(Bytes::from_static(b"%PDF"), "a.pdf").await.unwrap();
        assert_eq!(url, "/uploads/a.pdf");
        assert!(calls.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[tokio::test]
    async fn test_chain_stops_on_failure() {
        let (chain, calls) = chain(vec![Outcome::Failed, Outcome::Stored("/uploads/a.pdf")]);
        let err = chain.upload(Bytes::new(), "a.pdf").await.unwrap_err();
        assert!(matches!(err, UploadError::Failed { .. }));
        assert_eq!(calls[1].load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_chain_exhausted() {
        let (chain, _) = chain(vec![Outcome::NotConfigured]);
        let err = chain.upload(Bytes::new(), "a.pdf").await.unwrap_err();
        assert!(matches!(err, UploadError::Exhausted));
    }

    #[tokio::test]
    async fn test_default_chain_uses_local_disk_without_credentials() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            local_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let chain = UploadChain::from_settings(&settings);

        let url = chain
            .upload(Bytes::from_static(b"%PDF-1.5"), "../MP-30_1.0.pdf")
            .await
            .unwrap();
        assert_eq!(url, "/uploads/MP-30_1.0.pdf");
        assert!(dir.path().join("MP-30_1.0.pdf").exists());
    }

    #[tokio::test]
    async fn test_default_chain_does_not_bypass_malformed_media_url() {
        let dir = tempfile::tempdir().unwrap();
        let settings = StorageSettings {
            cloudinary_url: Some("cloudinary://no-secret-here".to_string()),
            local_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(settings.media_configured());
        let chain = UploadChain::from_settings(&settings);

        let err = chain
            .upload(Bytes::from_static(b"%PDF-1.5"), "X_1.0.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, UploadError::Failed { provider: "cloudinary", .. }));
        assert!(!dir.path().join("X_1.0.pdf").exists());
    }
}
