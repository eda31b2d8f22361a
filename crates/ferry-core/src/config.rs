//! Configuration: the process-level config file and the per-transfer
//! request.
//!
//! `FerryConfig` is loaded from `~/.config/ferry/config.toml` (created with
//! defaults on first run). `TransferRequest` is the validated, immutable
//! description of one relay; every field is checked before any network
//! call.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::error::TransferError;
use crate::planner::MIN_PART_SIZE;
use crate::retry::RetryPolicy;
use crate::store::S3StoreConfig;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts per transfer (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (e.g. 0.25 = 250ms).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.25,
            max_delay_secs: 30,
        }
    }
}

/// Destination bucket, endpoint, and credential sourcing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Endpoint URL for S3-compatible services (e.g. a Backblaze B2
    /// endpoint); empty means AWS proper.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region name.
    pub region: String,
    /// Destination bucket.
    pub bucket: String,
    /// Key prefix joined ahead of each work item name.
    #[serde(default)]
    pub upload_prefix: String,
    /// Environment variable holding the access key id.
    pub access_key_env: String,
    /// Environment variable holding the secret access key.
    pub secret_key_env: String,
}

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: "us-east-1".to_string(),
            bucket: String::new(),
            upload_prefix: String::new(),
            access_key_env: "FERRY_ACCESS_KEY_ID".to_string(),
            secret_key_env: "FERRY_SECRET_ACCESS_KEY".to_string(),
        }
    }
}

impl DestinationConfig {
    /// Store connection settings with credentials resolved from the
    /// configured environment variables (unset variables fall back to the
    /// ambient AWS credential chain).
    pub fn store_config(&self) -> S3StoreConfig {
        S3StoreConfig {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            access_key_id: std::env::var(&self.access_key_env).ok(),
            secret_access_key: std::env::var(&self.secret_key_env).ok(),
        }
    }
}

/// Default transfer knobs, overridable per invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferDefaults {
    /// Maximum concurrent in-flight parts. Peak memory is roughly
    /// `queue_size * part_size_bytes`; size it to the machine.
    pub queue_size: usize,
    /// Nominal bytes per part (raised automatically when the part-count
    /// ceiling would be exceeded).
    pub part_size_bytes: u64,
}

impl Default for TransferDefaults {
    fn default() -> Self {
        Self {
            queue_size: 16,
            part_size_bytes: 100 * 1024 * 1024,
        }
    }
}

/// Global configuration loaded from `~/.config/ferry/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FerryConfig {
    #[serde(default)]
    pub destination: DestinationConfig,
    #[serde(default)]
    pub transfer: TransferDefaults,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl FerryConfig {
    /// Whole-transfer retry policy from the `[retry]` section or defaults.
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
            .as_ref()
            .map(|r| RetryPolicy {
                max_attempts: r.max_attempts,
                base_delay: std::time::Duration::from_secs_f64(r.base_delay_secs),
                max_delay: std::time::Duration::from_secs(r.max_delay_secs),
            })
            .unwrap_or_default()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("ferry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FerryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FerryConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: FerryConfig = toml::from_str(&data)?;
    Ok(cfg)
}

/// Immutable description of one source → destination relay. Constructed
/// once per engine call; invalid combinations are rejected here, before
/// any network traffic.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// HTTP(S) URL of the source resource.
    pub source_url: String,
    /// Destination bucket.
    pub bucket: String,
    /// Destination object key.
    pub key: String,
    /// Key/value metadata attached to the destination object.
    pub metadata: HashMap<String, String>,
    /// Declared size of the source object; drives planning and the final
    /// byte-count verification.
    pub total_bytes: u64,
    /// Maximum concurrent in-flight parts.
    pub queue_size: usize,
    /// Nominal bytes per part.
    pub part_size: u64,
}

impl TransferRequest {
    pub fn new(
        source_url: impl Into<String>,
        bucket: impl Into<String>,
        key: impl Into<String>,
        metadata: HashMap<String, String>,
        total_bytes: u64,
        queue_size: usize,
        part_size: u64,
    ) -> Result<Self, TransferError> {
        let source_url = source_url.into();
        let bucket = bucket.into();
        let key = key.into();

        let parsed = url::Url::parse(&source_url)
            .map_err(|e| TransferError::Configuration(format!("source url: {e}")))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(TransferError::Configuration(format!(
                "source url must be http(s), got {}",
                parsed.scheme()
            )));
        }
        if bucket.is_empty() {
            return Err(TransferError::Configuration(
                "destination bucket must not be empty".to_string(),
            ));
        }
        if key.is_empty() {
            return Err(TransferError::Configuration(
                "destination key must not be empty".to_string(),
            ));
        }
        if total_bytes == 0 {
            return Err(TransferError::Configuration(
                "total size must be greater than zero".to_string(),
            ));
        }
        if queue_size == 0 {
            return Err(TransferError::Configuration(
                "queue size must be at least 1".to_string(),
            ));
        }
        if part_size < MIN_PART_SIZE {
            return Err(TransferError::Configuration(format!(
                "part size {} is below the protocol minimum of {} bytes",
                part_size, MIN_PART_SIZE
            )));
        }

        Ok(Self {
            source_url,
            bucket,
            key,
            metadata,
            total_bytes,
            queue_size,
            part_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = FerryConfig::default();
        assert_eq!(cfg.transfer.queue_size, 16);
        assert_eq!(cfg.transfer.part_size_bytes, 100 * 1024 * 1024);
        assert_eq!(cfg.destination.region, "us-east-1");
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = FerryConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: FerryConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.transfer.queue_size, cfg.transfer.queue_size);
        assert_eq!(parsed.transfer.part_size_bytes, cfg.transfer.part_size_bytes);
        assert_eq!(parsed.destination.region, cfg.destination.region);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            [destination]
            endpoint = "https://s3.us-west-004.backblazeb2.com"
            region = "us-west-004"
            bucket = "media-archive"
            upload_prefix = "incoming/"
            access_key_env = "B2_KEY_ID"
            secret_key_env = "B2_APP_KEY"

            [transfer]
            queue_size = 4
            part_size_bytes = 5242880
        "#;
        let cfg: FerryConfig = toml::from_str(toml).unwrap();
        assert_eq!(
            cfg.destination.endpoint.as_deref(),
            Some("https://s3.us-west-004.backblazeb2.com")
        );
        assert_eq!(cfg.destination.bucket, "media-archive");
        assert_eq!(cfg.transfer.queue_size, 4);
        assert_eq!(cfg.transfer.part_size_bytes, 5_242_880);
        assert!(cfg.retry.is_none());
    }

    #[test]
    fn config_toml_retry_section() {
        let toml = r#"
            [retry]
            max_attempts = 3
            base_delay_secs = 0.5
            max_delay_secs = 15
        "#;
        let cfg: FerryConfig = toml::from_str(toml).unwrap();
        let retry = cfg.retry.as_ref().unwrap();
        assert_eq!(retry.max_attempts, 3);
        assert!((retry.base_delay_secs - 0.5).abs() < 1e-9);
        assert_eq!(retry.max_delay_secs, 15);
        let policy = cfg.retry_policy();
        assert_eq!(policy.max_attempts, 3);
    }

    fn request_with(
        total_bytes: u64,
        queue_size: usize,
        part_size: u64,
    ) -> Result<TransferRequest, TransferError> {
        TransferRequest::new(
            "https://example.com/asset.mov",
            "bucket",
            "key",
            HashMap::new(),
            total_bytes,
            queue_size,
            part_size,
        )
    }

    #[test]
    fn request_accepts_valid_inputs() {
        let req = request_with(1_000_000_000, 4, MIN_PART_SIZE).unwrap();
        assert_eq!(req.total_bytes, 1_000_000_000);
        assert_eq!(req.queue_size, 4);
    }

    #[test]
    fn request_rejects_bad_inputs() {
        assert!(request_with(0, 4, MIN_PART_SIZE).is_err());
        assert!(request_with(100, 0, MIN_PART_SIZE).is_err());
        assert!(request_with(100, 4, MIN_PART_SIZE - 1).is_err());
        assert!(TransferRequest::new(
            "ftp://example.com/file",
            "bucket",
            "key",
            HashMap::new(),
            100,
            4,
            MIN_PART_SIZE,
        )
        .is_err());
        assert!(TransferRequest::new(
            "not a url",
            "bucket",
            "key",
            HashMap::new(),
            100,
            4,
            MIN_PART_SIZE,
        )
        .is_err());
        assert!(TransferRequest::new(
            "https://example.com/file",
            "",
            "key",
            HashMap::new(),
            100,
            4,
            MIN_PART_SIZE,
        )
        .is_err());
    }
}
