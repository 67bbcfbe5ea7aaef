//! Configuration management for towerdocs using the prefer crate.
//!
//! Settings are layered: built-in defaults, then an optional `towerdocs`
//! config file discovered by prefer, then environment variables (including
//! a `.env` file loaded by the binary), then CLI flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default maximum upload size in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: u64 = 10;

/// Default folder for the managed media service.
pub const DEFAULT_MEDIA_FOLDER: &str = "tower-docs";

/// Default object storage region.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";

/// Admin credential settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct AdminSettings {
    #[serde(default)]
    #[prefer(default)]
    pub username: String,
    /// Plain password or a bcrypt hash (`$2b$...`).
    #[serde(default)]
    #[prefer(default)]
    pub password: String,
}

/// Storage backend settings. Every backend is optional; which one is used is
/// decided per upload by `storage::UploadChain`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
#[serde(default)]
pub struct StorageSettings {
    /// Composite managed media URL: `cloudinary://<key>:<secret>@<cloud>`.
    pub cloudinary_url: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_folder: Option<String>,
    pub aws_access_key_id: Option<String>,
    pub aws_secret_access_key: Option<String>,
    pub aws_bucket: Option<String>,
    pub aws_region: Option<String>,
    pub aws_endpoint_url: Option<String>,
    /// Directory for local-disk uploads (not serialized; derived from data dir).
    #[serde(skip)]
    #[prefer(skip)]
    pub local_dir: PathBuf,
}

impl StorageSettings {
    /// Overlay values from the process environment.
    ///
    /// Called on every upload so credentials injected after startup are seen.
    pub fn with_env_overrides(&self) -> Self {
        let mut settings = self.clone();
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    /// Overlay values from an arbitrary lookup (empty values are ignored).
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let fields: [(&str, &mut Option<String>); 10] = [
            ("CLOUDINARY_URL", &mut self.cloudinary_url),
            ("CLOUDINARY_CLOUD_NAME", &mut self.cloudinary_cloud_name),
            ("CLOUDINARY_API_KEY", &mut self.cloudinary_api_key),
            ("CLOUDINARY_API_SECRET", &mut self.cloudinary_api_secret),
            ("CLOUDINARY_FOLDER", &mut self.cloudinary_folder),
            ("AWS_ACCESS_KEY_ID", &mut self.aws_access_key_id),
            ("AWS_SECRET_ACCESS_KEY", &mut self.aws_secret_access_key),
            ("AWS_STORAGE_BUCKET_NAME", &mut self.aws_bucket),
            ("AWS_S3_REGION", &mut self.aws_region),
            ("AWS_S3_ENDPOINT_URL", &mut self.aws_endpoint_url),
        ];
        for (key, slot) in fields {
            if let Some(value) = get(key) {
                *slot = Some(value);
            }
        }
    }

    /// Folder used for managed media uploads.
    pub fn media_folder(&self) -> &str {
        self.cloudinary_folder
            .as_deref()
            .unwrap_or(DEFAULT_MEDIA_FOLDER)
    }

    /// Object storage region.
    pub fn region(&self) -> &str {
        self.aws_region.as_deref().unwrap_or(DEFAULT_S3_REGION)
    }

    /// True if the managed media service has usable configuration.
    pub fn media_configured(&self) -> bool {
        self.cloudinary_url.is_some()
            || (self.cloudinary_cloud_name.is_some()
                && self.cloudinary_api_key.is_some()
                && self.cloudinary_api_secret.is_some())
    }

    /// True if object storage credentials are present.
    pub fn object_storage_configured(&self) -> bool {
        self.aws_access_key_id.is_some() && self.aws_secret_access_key.is_some()
    }

    /// True if any remote backend is configured (local disk is always available).
    pub fn remote_configured(&self) -> bool {
        self.media_configured() || self.object_storage_configured()
    }
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename (inside `data_dir`).
    pub database_filename: String,
    /// Explicit database URL; takes precedence over `database_filename`.
    pub database_url: Option<String>,
    /// Directory for locally stored uploads.
    pub uploads_dir: PathBuf,
    /// Address the web server binds to.
    pub bind: String,
    /// Maximum accepted upload size in bytes.
    pub max_upload_bytes: u64,
    /// Key used to sign session cookies.
    pub secret_key: String,
    /// Admin credentials.
    pub admin: AdminSettings,
    /// Storage backends.
    pub storage: StorageSettings,
}

impl Default for Settings {
    fn default() -> Self {
        // Falls back gracefully: data dir -> home dir -> current dir
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("towerdocs");

        Self::with_data_dir(data_dir)
    }
}

impl Settings {
    /// Create settings with a custom data directory.
    pub fn with_data_dir(data_dir: PathBuf) -> Self {
        let uploads_dir = data_dir.join("uploads");
        Self {
            storage: StorageSettings {
                local_dir: uploads_dir.clone(),
                ..Default::default()
            },
            uploads_dir,
            data_dir,
            database_filename: "tower_docs.db".to_string(),
            database_url: None,
            bind: "0.0.0.0:5000".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_MB * 1024 * 1024,
            secret_key: DEV_SECRET_KEY.to_string(),
            admin: AdminSettings {
                username: "admin".to_string(),
                password: "admin123".to_string(),
            },
        }
    }

    /// Get the full path to the database.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    /// Connection string handed to Diesel.
    ///
    /// Accepts `sqlite:///path`, `sqlite://path` or a bare path in `DATABASE_URL`.
    pub fn database_connection_string(&self) -> String {
        match &self.database_url {
            Some(url) => url
                .strip_prefix("sqlite:///")
                .or_else(|| url.strip_prefix("sqlite://"))
                .unwrap_or(url)
                .to_string(),
            None => self.database_path().to_string_lossy().to_string(),
        }
    }

    /// True if the session secret is still the development default.
    pub fn uses_dev_secret(&self) -> bool {
        self.secret_key == DEV_SECRET_KEY
    }

    /// Ensure all directories exist.
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(&self.uploads_dir)?;
        Ok(())
    }

    /// Overlay environment variables onto settings.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("DATABASE_URL") {
            self.database_url = Some(url);
        }
        if let Some(key) = get("SECRET_KEY") {
            self.secret_key = key;
        }
        if let Some(username) = get("ADMIN_USERNAME") {
            self.admin.username = username;
        }
        if let Some(password) = get("ADMIN_PASSWORD") {
            self.admin.password = password;
        }
        if let Some(bind) = get("TOWERDOCS_BIND") {
            self.bind = bind;
        } else if let Some(port) = get("PORT").and_then(|p| p.parse::<u16>().ok()) {
            self.bind = format!("0.0.0.0:{}", port);
        }
        if let Some(mb) = get("TOWERDOCS_MAX_UPLOAD_MB").and_then(|v| v.parse::<u64>().ok()) {
            self.max_upload_bytes = mb * 1024 * 1024;
        }
        self.storage.apply_env(lookup);
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target directory for data.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Bind address for the web server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Upload size limit in megabytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_upload_mb: Option<u64>,
    /// Session signing key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Admin credentials.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<AdminSettings>,
    /// Storage backends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageSettings>,

    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate.
    /// Automatically discovers towerdocs config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("towerdocs").await {
            Ok(pref_config) => {
                let target: Option<String> = pref_config.get("target").ok();
                let database: Option<String> = pref_config.get("database").ok();
                let bind: Option<String> = pref_config.get("bind").ok();
                let max_upload_mb: Option<u64> = pref_config.get("max_upload_mb").ok();
                let secret_key: Option<String> = pref_config.get("secret_key").ok();
                let admin: Option<AdminSettings> = pref_config.get("admin").ok();
                let storage: Option<StorageSettings> = pref_config.get("storage").ok();

                let source_path = pref_config.source_path().cloned();

                Config {
                    target,
                    database,
                    bind,
                    max_upload_mb,
                    secret_key,
                    admin,
                    storage,
                    source_path,
                }
            }
            Err(_) => {
                // No config file found, use defaults
                Self::default()
            }
        }
    }

    /// Load configuration from a specific file path (JSON or TOML by extension).
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        let mut config: Config = if is_toml {
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse config file: {}", e))?
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref target) = self.target {
            let data_dir = self.resolve_path(target, base_dir);
            settings.uploads_dir = data_dir.join("uploads");
            settings.storage.local_dir = settings.uploads_dir.clone();
            settings.data_dir = data_dir;
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(mb) = self.max_upload_mb {
            settings.max_upload_bytes = mb * 1024 * 1024;
        }
        if let Some(ref key) = self.secret_key {
            settings.secret_key = key.clone();
        }
        if let Some(ref admin) = self.admin {
            if !admin.username.is_empty() {
                settings.admin.username = admin.username.clone();
            }
            if !admin.password.is_empty() {
                settings.admin.password = admin.password.clone();
            }
        }
        if let Some(ref storage) = self.storage {
            let local_dir = settings.storage.local_dir.clone();
            settings.storage = StorageSettings {
                local_dir,
                ..storage.clone()
            };
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Override data directory (--data-dir flag).
    pub data_dir: Option<PathBuf>,
}

/// Load settings with explicit options.
pub async fn load_settings_with_options(options: LoadOptions) -> Settings {
    let config = match &options.config_path {
        Some(path) => match Config::load_from_path(path).await {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}; using defaults", e);
                Config::default()
            }
        },
        None => Config::load().await,
    };

    let mut settings = Settings::default();

    let base_dir = if options.use_cwd {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    } else {
        config
            .base_dir()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    };

    config.apply_to_settings(&mut settings, &base_dir);

    // --data-dir override takes precedence over the config file
    if let Some(data_dir) = options.data_dir {
        let mut overridden = Settings::with_data_dir(data_dir);
        overridden.database_filename = settings.database_filename;
        overridden.bind = settings.bind;
        overridden.max_upload_bytes = settings.max_upload_bytes;
        overridden.secret_key = settings.secret_key;
        overridden.admin = settings.admin;
        overridden.storage = StorageSettings {
            local_dir: overridden.uploads_dir.clone(),
            ..settings.storage
        };
        settings = overridden;
    }

    settings.apply_env(|key| std::env::var(key).ok());
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_database_url_prefix_stripped() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/srv/towers"));
        assert_eq!(
            settings.database_connection_string(),
            "/srv/towers/tower_docs.db"
        );

        settings.database_url = Some("sqlite:///tmp/towers.db".to_string());
        assert_eq!(settings.database_connection_string(), "tmp/towers.db");

        settings.database_url = Some("/var/lib/towers.db".to_string());
        assert_eq!(settings.database_connection_string(), "/var/lib/towers.db");
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = Settings::with_data_dir(PathBuf::from("/srv/towers"));
        settings.apply_env(lookup(&[
            ("ADMIN_USERNAME", "ops"),
            ("ADMIN_PASSWORD", ""),
            ("PORT", "8080"),
            ("TOWERDOCS_MAX_UPLOAD_MB", "25"),
            ("AWS_STORAGE_BUCKET_NAME", "specs"),
        ]));

        assert_eq!(settings.admin.username, "ops");
        // Empty values do not override
        assert_eq!(settings.admin.password, "admin123");
        assert_eq!(settings.bind, "0.0.0.0:8080");
        assert_eq!(settings.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(settings.storage.aws_bucket.as_deref(), Some("specs"));
    }

    #[test]
    fn test_storage_configuration_flags() {
        let mut storage = StorageSettings::default();
        assert!(!storage.remote_configured());

        storage.cloudinary_cloud_name = Some("demo".to_string());
        storage.cloudinary_api_key = Some("key".to_string());
        assert!(!storage.media_configured());
        storage.cloudinary_api_secret = Some("secret".to_string());
        assert!(storage.media_configured());

        let mut storage = StorageSettings::default();
        storage.apply_env(lookup(&[
            ("AWS_ACCESS_KEY_ID", "AKIA"),
            ("AWS_SECRET_ACCESS_KEY", "shh"),
        ]));
        assert!(storage.object_storage_configured());
        assert_eq!(storage.region(), DEFAULT_S3_REGION);
        assert_eq!(storage.media_folder(), DEFAULT_MEDIA_FOLDER);
    }

    #[test]
    fn test_apply_config_target_moves_uploads() {
        let config = Config {
            target: Some("data".to_string()),
            max_upload_mb: Some(4),
            ..Default::default()
        };
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, Path::new("/opt/app"));

        assert_eq!(settings.data_dir, PathBuf::from("/opt/app/data"));
        assert_eq!(settings.uploads_dir, PathBuf::from("/opt/app/data/uploads"));
        assert_eq!(settings.storage.local_dir, settings.uploads_dir);
        assert_eq!(settings.max_upload_bytes, 4 * 1024 * 1024);
    }
}
