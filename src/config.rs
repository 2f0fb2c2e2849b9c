use crate::error::{GenImageError, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_S3_REGION: &str = "us-east-1";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilesystemConfig {
    pub save_path: Option<PathBuf>,
}

#[derive(Clone)]
pub struct ObjectStoreConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub bucket: Option<String>,
    pub secure: bool,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct StorageConfig {
    pub filesystem: FilesystemConfig,
    pub object_store: ObjectStoreConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub storage: StorageConfig,
}

/// Reads a variable, treating empty values the same as unset ones.
fn lookup_non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            base_url: None,
        }
    }
}

impl GeminiConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        GeminiConfig {
            api_key: lookup_non_empty(&lookup, "GEMINI_API_KEY"),
            base_url: lookup_non_empty(&lookup, "GEMINI_BASE_URL"),
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_GEMINI_BASE_URL)
    }
}

impl Default for FilesystemConfig {
    fn default() -> Self {
        FilesystemConfig { save_path: None }
    }
}

impl FilesystemConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        FilesystemConfig {
            save_path: lookup_non_empty(&lookup, "FILESYSTEM_SAVE_PATH").map(PathBuf::from),
        }
    }

    pub fn with_save_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.save_path = Some(path.into());
        self
    }

    /// The configured directory, if it exists. Writability is not checked.
    pub fn existing_dir(&self) -> Option<&PathBuf> {
        self.save_path.as_ref().filter(|path| path.is_dir())
    }
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        ObjectStoreConfig {
            endpoint: None,
            access_key: None,
            secret_key: None,
            bucket: None,
            secure: true,
            region: None,
        }
    }
}

impl fmt::Debug for ObjectStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStoreConfig")
            .field("endpoint", &self.endpoint)
            .field("access_key", &self.access_key.as_ref().map(|_| "<set>"))
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("bucket", &self.bucket)
            .field("secure", &self.secure)
            .field("region", &self.region)
            .finish()
    }
}

impl ObjectStoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let secure = lookup_non_empty(&lookup, "S3_SECURE")
            .map_or(true, |val| val.eq_ignore_ascii_case("true"));

        ObjectStoreConfig {
            endpoint: lookup_non_empty(&lookup, "S3_ENDPOINT"),
            access_key: lookup_non_empty(&lookup, "S3_ACCESS_KEY"),
            secret_key: lookup_non_empty(&lookup, "S3_SECRET_KEY"),
            bucket: lookup_non_empty(&lookup, "S3_BUCKET_NAME"),
            secure,
            region: lookup_non_empty(&lookup, "S3_REGION"),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_credentials(
        mut self,
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        self.access_key = Some(access_key.into());
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// All four of endpoint, access key, secret key and bucket are present.
    pub fn is_complete(&self) -> bool {
        self.endpoint.is_some()
            && self.access_key.is_some()
            && self.secret_key.is_some()
            && self.bucket.is_some()
    }

    pub fn region(&self) -> &str {
        self.region.as_deref().unwrap_or(DEFAULT_S3_REGION)
    }

    /// MinIO-style endpoints are usually given as `host:port`; the scheme
    /// follows the TLS flag unless one is already present.
    pub fn endpoint_url(&self) -> Option<String> {
        let endpoint = self.endpoint.as_deref()?;
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return Some(endpoint.trim_end_matches('/').to_string());
        }
        let scheme = if self.secure { "https" } else { "http" };
        Some(format!("{}://{}", scheme, endpoint.trim_end_matches('/')))
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        StorageConfig {
            filesystem: FilesystemConfig::from_lookup(&lookup),
            object_store: ObjectStoreConfig::from_lookup(&lookup),
        }
    }

    pub fn with_filesystem(mut self, config: FilesystemConfig) -> Self {
        self.filesystem = config;
        self
    }

    pub fn with_object_store(mut self, config: ObjectStoreConfig) -> Self {
        self.object_store = config;
        self
    }
}

impl AppConfig {
    /// Loads everything from the process environment. A missing
    /// `GEMINI_API_KEY` is fatal.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini = GeminiConfig::from_lookup(&lookup);
        if gemini.api_key.is_none() {
            return Err(GenImageError::ConfigError(
                "GEMINI_API_KEY environment variable not set".into(),
            ));
        }

        Ok(AppConfig {
            gemini,
            storage: StorageConfig::from_lookup(&lookup),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = AppConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.is_fatal());

        let err = AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, GenImageError::ConfigError(_)));
    }

    #[test]
    fn test_app_config_reads_storage_settings() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("GEMINI_API_KEY", "key"),
            ("FILESYSTEM_SAVE_PATH", "/srv/images"),
            ("S3_ENDPOINT", "localhost:9000"),
            ("S3_ACCESS_KEY", "minio"),
            ("S3_SECRET_KEY", "minio123"),
            ("S3_BUCKET_NAME", "generated"),
        ]))
        .unwrap();

        assert_eq!(config.gemini.api_key.as_deref(), Some("key"));
        assert_eq!(config.gemini.base_url(), DEFAULT_GEMINI_BASE_URL);
        assert_eq!(
            config.storage.filesystem.save_path,
            Some(PathBuf::from("/srv/images"))
        );
        assert!(config.storage.object_store.is_complete());
        assert!(config.storage.object_store.secure);
        assert_eq!(config.storage.object_store.region(), DEFAULT_S3_REGION);
    }

    #[test]
    fn test_s3_secure_flag_parsing() {
        let parse = |value: &str| ObjectStoreConfig::from_lookup(lookup_from(&[("S3_SECURE", value)])).secure;
        assert!(parse("true"));
        assert!(parse("TRUE"));
        assert!(!parse("false"));
        assert!(!parse("yes"));
        assert!(ObjectStoreConfig::from_lookup(lookup_from(&[])).secure);
    }

    #[test]
    fn test_object_store_needs_all_four_parameters() {
        let partial = ObjectStoreConfig::new()
            .with_endpoint("localhost:9000")
            .with_credentials("minio", "minio123");
        assert!(!partial.is_complete());
        assert!(partial.with_bucket("generated").is_complete());
    }

    #[test]
    fn test_endpoint_url_follows_tls_flag() {
        let config = ObjectStoreConfig::new().with_endpoint("localhost:9000");
        assert_eq!(config.endpoint_url().as_deref(), Some("https://localhost:9000"));

        let config = config.with_secure(false);
        assert_eq!(config.endpoint_url().as_deref(), Some("http://localhost:9000"));

        let config = ObjectStoreConfig::new().with_endpoint("https://s3.example.com/");
        assert_eq!(config.endpoint_url().as_deref(), Some("https://s3.example.com"));
    }

    #[test]
    fn test_debug_output_redacts_secret() {
        let config = ObjectStoreConfig::new().with_credentials("AKIA123", "very-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("AKIA123"));
    }
}
