use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    env, fs,
    net::IpAddr,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;
use url::Url;

use crate::services::object_store::Visibility;

/// Process-level configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub config_path: PathBuf,
    pub in_memory: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Browsable file manager API over S3-compatible storage")]
pub struct Args {
    /// Host to bind to (overrides FILE_BROWSER_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides FILE_BROWSER_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the file-manager TOML config (overrides FILE_BROWSER_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Serve every configured disk from process memory instead of the network
    #[arg(long)]
    pub in_memory: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("FILE_BROWSER_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("FILE_BROWSER_PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing FILE_BROWSER_PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 3000,
            Err(err) => return Err(err).context("reading FILE_BROWSER_PORT"),
        };
        let env_config = env::var("FILE_BROWSER_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./file-browser.toml"));

        // --- Merge ---
        Ok(Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            config_path: args.config.unwrap_or(env_config),
            in_memory: args.in_memory,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Disk configuration problems. Never retried: the fix is a config change.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("disk `{0}` is not configured")]
    UnknownDisk(String),

    #[error("disk `{disk}` uses driver `{driver}`; only `s3` disks are supported")]
    UnsupportedDriver { disk: String, driver: String },

    #[error("disk `{0}` has no bucket configured")]
    MissingBucket(String),

    #[error("disk `{0}` has no region configured")]
    MissingRegion(String),

    #[error("disk `{disk}` endpoint `{endpoint}` is invalid: {reason}")]
    InvalidEndpoint {
        disk: String,
        endpoint: String,
        reason: String,
    },

    #[error("disk `{disk}`: {provider} endpoints require use_path_style_endpoint = {expected}")]
    PathStyleMismatch {
        disk: String,
        provider: &'static str,
        expected: bool,
    },
}

/// One named binding to an S3-compatible bucket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DiskConfig {
    pub driver: String,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub use_path_style_endpoint: bool,
    pub key: Option<String>,
    pub secret: Option<String>,
    /// ACL given to uploaded objects and folder markers.
    pub visibility: Visibility,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            driver: "s3".to_string(),
            bucket: String::new(),
            region: "us-east-1".to_string(),
            endpoint: None,
            use_path_style_endpoint: false,
            key: None,
            secret: None,
            visibility: Visibility::Private,
        }
    }
}

/// Addressing rules for S3-compatible providers recognisable from their endpoint host.
const PROVIDER_ADDRESSING: [(&str, &str, bool); 2] = [
    (".r2.cloudflarestorage.com", "Cloudflare R2", true),
    (".digitaloceanspaces.com", "DigitalOcean Spaces", false),
];

impl DiskConfig {
    /// Check that this disk can be used at all, before any network call.
    pub fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if !self.driver.eq_ignore_ascii_case("s3") {
            return Err(ConfigError::UnsupportedDriver {
                disk: name.to_string(),
                driver: self.driver.clone(),
            });
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::MissingBucket(name.to_string()));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::MissingRegion(name.to_string()));
        }

        let Some(endpoint) = self.endpoint.as_deref().filter(|e| !e.trim().is_empty()) else {
            return Ok(());
        };
        let invalid = |reason: &str| ConfigError::InvalidEndpoint {
            disk: name.to_string(),
            endpoint: endpoint.to_string(),
            reason: reason.to_string(),
        };

        let url = Url::parse(endpoint).map_err(|e| invalid(&e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid("scheme must be http or https"));
        }
        let host = url
            .host_str()
            .ok_or_else(|| invalid("missing host"))?
            .to_ascii_lowercase();

        for (suffix, provider, expected) in PROVIDER_ADDRESSING {
            if host.ends_with(suffix) && self.use_path_style_endpoint != expected {
                return Err(ConfigError::PathStyleMismatch {
                    disk: name.to_string(),
                    provider,
                    expected,
                });
            }
        }

        // Virtual-hosted addressing needs a DNS name to prepend the bucket to.
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        let is_ip_or_local = bare_host == "localhost" || bare_host.parse::<IpAddr>().is_ok();
        if is_ip_or_local && !self.use_path_style_endpoint {
            return Err(ConfigError::PathStyleMismatch {
                disk: name.to_string(),
                provider: "IP address and localhost",
                expected: true,
            });
        }

        Ok(())
    }

    /// Access key and secret, falling back to the standard AWS environment variables.
    pub fn credentials(&self) -> (String, String) {
        let key = self
            .key
            .clone()
            .or_else(|| env::var("AWS_ACCESS_KEY_ID").ok())
            .unwrap_or_default();
        let secret = self
            .secret
            .clone()
            .or_else(|| env::var("AWS_SECRET_ACCESS_KEY").ok())
            .unwrap_or_default();
        (key, secret)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Seconds a folder listing or tree stays cached.
    pub ttl: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl: 300, // 5 minutes
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RateLimitConfig {
    pub default_per_minute: u32,
    pub upload_per_minute: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_per_minute: 60,
            upload_per_minute: 10,
        }
    }
}

/// File-manager settings loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FileManagerConfig {
    /// Disk used by uploads that do not name one.
    pub default_disk: String,

    /// Presigned preview URL lifetime in seconds.
    pub presigned_url_expiration: u64,

    /// Maximum upload size in kilobytes.
    pub max_file_size: u64,

    /// Lowercase extensions accepted by uploads.
    pub allowed_extensions: Vec<String>,

    /// Mount point for the API routes.
    pub route_prefix: String,

    pub cache: CacheConfig,

    pub rate_limits: RateLimitConfig,

    /// Reverse proxies whose `x-forwarded-for` is believed when rate limiting.
    pub trusted_proxies: Vec<IpAddr>,

    pub disks: HashMap<String, DiskConfig>,
}

impl Default for FileManagerConfig {
    fn default() -> Self {
        Self {
            default_disk: "s3".to_string(),
            presigned_url_expiration: 3600,
            max_file_size: 2_048_000, // 2GB
            allowed_extensions: default_allowed_extensions(),
            route_prefix: "/api/s3-files".to_string(),
            cache: CacheConfig::default(),
            rate_limits: RateLimitConfig::default(),
            trusted_proxies: Vec::new(),
            disks: HashMap::new(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    [
        // Videos
        "mp4", "webm", "ogg", "mov", "avi", "quicktime",
        // PDFs
        "pdf",
        // Documents
        "doc", "docx", "txt",
        // Images
        "jpg", "jpeg", "png", "gif", "webp", "svg",
        // Presentations
        "ppt", "pptx",
        // Audio
        "mp3", "wav", "m4a",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

impl FileManagerConfig {
    /// Load from `path`. A missing file yields the defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Config file {} not found, starting with defaults and no disks",
                path.display()
            );
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut config: Self = toml::from_str(raw)?;
        config.allowed_extensions = config
            .allowed_extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect();
        Ok(config)
    }

    /// Look up and validate a disk.
    pub fn disk(&self, name: &str) -> Result<&DiskConfig, ConfigError> {
        let disk = self
            .disks
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDisk(name.to_string()))?;
        disk.validate(name)?;
        Ok(disk)
    }

    pub fn has_disk(&self, name: &str) -> bool {
        self.disks.contains_key(name)
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_file_size.saturating_mul(1024)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl)
    }

    pub fn presigned_ttl(&self) -> Duration {
        Duration::from_secs(self.presigned_url_expiration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn disk(endpoint: &str, path_style: bool) -> DiskConfig {
        DiskConfig {
            bucket: "media".into(),
            endpoint: Some(endpoint.into()),
            use_path_style_endpoint: path_style,
            ..DiskConfig::default()
        }
    }

    #[test]
    fn parses_toml_with_defaults() {
        let config = FileManagerConfig::from_toml(
            r#"
            default_disk = "media"
            allowed_extensions = ["PDF", ".png"]
            trusted_proxies = ["10.0.0.1", "::1"]

            [cache]
            ttl = 60

            [disks.media]
            bucket = "media-bucket"
            region = "eu-west-1"
            visibility = "public"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_disk, "media");
        assert_eq!(config.allowed_extensions, vec!["pdf", "png"]);
        assert_eq!(
            config.trusted_proxies,
            vec![IpAddr::from([10, 0, 0, 1]), "::1".parse::<IpAddr>().unwrap()]
        );
        assert_eq!(config.cache_ttl(), Duration::from_secs(60));
        assert!(config.cache.enabled);
        assert_eq!(config.presigned_url_expiration, 3600);
        assert_eq!(config.max_upload_bytes(), 2_048_000 * 1024);
        let media = config.disk("media").unwrap();
        assert_eq!(media.driver, "s3");
        assert_eq!(media.region, "eu-west-1");
        assert_eq!(media.visibility, Visibility::Public);
        assert_eq!(DiskConfig::default().visibility, Visibility::Private);
    }

    #[test]
    fn loads_from_file_and_tolerates_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "presigned_url_expiration = 120").unwrap();
        let config = FileManagerConfig::load(file.path()).unwrap();
        assert_eq!(config.presigned_ttl(), Duration::from_secs(120));

        let missing = FileManagerConfig::load(Path::new("/nonexistent/file-browser.toml")).unwrap();
        assert!(missing.disks.is_empty());
    }

    #[test]
    fn example_config_is_valid() {
        let config =
            FileManagerConfig::from_toml(include_str!("../file-browser.example.toml")).unwrap();
        assert_eq!(config, {
            let mut expected = config.clone();
            expected.allowed_extensions = default_allowed_extensions();
            expected
        });
        assert!(config.disk("s3").is_ok());
        assert!(config.disk("minio").is_ok());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "cache = \"nope\"").unwrap();
        assert!(FileManagerConfig::load(file.path()).is_err());
    }

    #[test]
    fn unknown_disk_and_wrong_driver() {
        let mut config = FileManagerConfig::default();
        assert_eq!(
            config.disk("s3"),
            Err(ConfigError::UnknownDisk("s3".into()))
        );
        config.disks.insert(
            "local".into(),
            DiskConfig {
                driver: "local".into(),
                bucket: "x".into(),
                ..DiskConfig::default()
            },
        );
        assert!(matches!(
            config.disk("local"),
            Err(ConfigError::UnsupportedDriver { .. })
        ));
    }

    #[test]
    fn rejects_malformed_endpoints() {
        assert!(matches!(
            disk("not a url", true).validate("d"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            disk("ftp://files.example.com", true).validate("d"),
            Err(ConfigError::InvalidEndpoint { .. })
        ));
        assert!(disk("https://s3.example.com", false).validate("d").is_ok());
    }

    #[test]
    fn enforces_provider_addressing() {
        assert!(matches!(
            disk("https://acct.r2.cloudflarestorage.com", false).validate("d"),
            Err(ConfigError::PathStyleMismatch { expected: true, .. })
        ));
        assert!(disk("https://acct.r2.cloudflarestorage.com", true).validate("d").is_ok());

        assert!(matches!(
            disk("https://nyc3.digitaloceanspaces.com", true).validate("d"),
            Err(ConfigError::PathStyleMismatch { expected: false, .. })
        ));
        assert!(disk("https://nyc3.digitaloceanspaces.com", false).validate("d").is_ok());

        assert!(disk("http://localhost:9000", false).validate("d").is_err());
        assert!(disk("http://127.0.0.1:9000", false).validate("d").is_err());
        assert!(disk("http://127.0.0.1:9000", true).validate("d").is_ok());
    }
}
