//! Configuration module
//!
//! Configuration comes from environment variables (a `.env` file is loaded
//! first when present). `Config` is consumed by the API server and the CLI;
//! `FilterServiceConfig` by the transform service.

use std::env;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const SERVER_PORT: u16 = 8080;
const FILTER_PORT: u16 = 8082;
const SIGNED_URL_EXPIRY_SECS: u64 = 5 * 60;
const MAX_SIGNED_URL_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;
const TRANSFORM_TIMEOUT_SECS: u64 = 30;
const UPLOAD_TIMEOUT_SECS: u64 = 30;
const FILTER_FETCH_TIMEOUT_SECS: u64 = 30;
const FILTER_MAX_INPUT_MB: usize = 20;
const FILTER_OUTPUT_SIZE: u32 = 256;
const FILTER_JPEG_QUALITY: u8 = 60;
const MIN_SIGNING_KEY_LENGTH: usize = 32;

/// Settings shared by every server binary
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    /// `LOG_FORMAT=json` switches the fmt layer to JSON lines
    pub log_json: bool,
}

impl BaseConfig {
    fn from_vars<F>(get: &F, port_var: &str, default_port: u16) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = get("ENVIRONMENT")
            .or_else(|| get("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = get("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        if is_production_name(&environment) && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins = split_csv(&cors_origins_str);

        let server_port = parse_or(get, port_var, default_port)?;

        let log_json = match get("LOG_FORMAT") {
            Some(format) => match format.trim().to_lowercase().as_str() {
                "json" => true,
                "text" | "pretty" | "compact" => false,
                other => return Err(anyhow::anyhow!("Invalid LOG_FORMAT: {}", other)),
            },
            None => false,
        };

        Ok(Self {
            server_port,
            cors_origins,
            environment,
            log_json,
        })
    }

    pub fn is_production(&self) -> bool {
        is_production_name(&self.environment)
    }
}

/// Relay, storage and feed API configuration
#[derive(Clone, Debug)]
pub struct PixfeedConfig {
    pub base: BaseConfig,
    // Storage configuration
    pub storage_backend: StorageBackend,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub signed_url_expiry_secs: u64,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub local_signing_key: Option<String>,
    // Transform service
    pub transform_service_url: String,
    pub transform_timeout_secs: u64,
    pub upload_timeout_secs: u64,
}

impl PixfeedConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source
    pub fn from_vars<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = BaseConfig::from_vars(&get, "SERVER_PORT", SERVER_PORT)?;

        let storage_backend = match get("STORAGE_BACKEND") {
            Some(value) => value.parse::<StorageBackend>()?,
            None => StorageBackend::S3,
        };

        let transform_service_url = get("TRANSFORM_SERVICE_URL")
            .or_else(|| get("IMAGE_TRANSFORM_HOST"))
            .map(|raw| normalize_base_url(&raw))
            .ok_or_else(|| anyhow::anyhow!("TRANSFORM_SERVICE_URL is not set"))?;

        Ok(Self {
            base,
            storage_backend,
            s3_bucket: get("S3_BUCKET"),
            s3_region: get("S3_REGION").or_else(|| get("AWS_REGION")),
            s3_endpoint: get("S3_ENDPOINT"),
            signed_url_expiry_secs: parse_or(&get, "SIGNED_URL_EXPIRY_SECS", SIGNED_URL_EXPIRY_SECS)?,
            local_storage_path: get("LOCAL_STORAGE_PATH"),
            local_storage_base_url: get("LOCAL_STORAGE_BASE_URL"),
            local_signing_key: get("LOCAL_SIGNING_KEY"),
            transform_service_url,
            transform_timeout_secs: parse_or(&get, "TRANSFORM_TIMEOUT_SECS", TRANSFORM_TIMEOUT_SECS)?,
            upload_timeout_secs: parse_or(&get, "UPLOAD_TIMEOUT_SECS", UPLOAD_TIMEOUT_SECS)?,
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.signed_url_expiry_secs == 0
            || self.signed_url_expiry_secs > MAX_SIGNED_URL_EXPIRY_SECS
        {
            return Err(anyhow::anyhow!(
                "SIGNED_URL_EXPIRY_SECS must be between 1 and {}",
                MAX_SIGNED_URL_EXPIRY_SECS
            ));
        }

        if self.transform_timeout_secs == 0 || self.upload_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "TRANSFORM_TIMEOUT_SECS and UPLOAD_TIMEOUT_SECS must be greater than 0"
            ));
        }

        match self.storage_backend {
            StorageBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!("S3_BUCKET not configured"));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!("S3_REGION or AWS_REGION not configured"));
                }
            }
            StorageBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!("LOCAL_STORAGE_PATH not configured"));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!("LOCAL_STORAGE_BASE_URL not configured"));
                }
                match &self.local_signing_key {
                    Some(key) if key.len() >= MIN_SIGNING_KEY_LENGTH => {}
                    _ => {
                        return Err(anyhow::anyhow!(
                            "LOCAL_SIGNING_KEY must be at least {} characters long",
                            MIN_SIGNING_KEY_LENGTH
                        ))
                    }
                }
            }
        }

        Ok(())
    }
}

/// Application configuration (feed API, relay and CLI).
#[derive(Clone, Debug)]
pub struct Config(pub Box<PixfeedConfig>);

impl Config {
    fn inner(&self) -> &PixfeedConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = PixfeedConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn from_vars<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config(Box::new(PixfeedConfig::from_vars(get)?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        self.inner().base.is_production()
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn log_json(&self) -> bool {
        self.inner().base.log_json
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.inner().storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn signed_url_expiry(&self) -> Duration {
        Duration::from_secs(self.inner().signed_url_expiry_secs)
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn local_signing_key(&self) -> Option<&str> {
        self.inner().local_signing_key.as_deref()
    }

    pub fn transform_service_url(&self) -> &str {
        &self.inner().transform_service_url
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().transform_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Duration {
        Duration::from_secs(self.inner().upload_timeout_secs)
    }
}

/// Transform (filter) service configuration
#[derive(Clone, Debug)]
pub struct FilterServiceConfig {
    pub base: BaseConfig,
    pub fetch_timeout_secs: u64,
    pub max_input_bytes: usize,
    pub output_size: u32,
    pub jpeg_quality: u8,
    pub allow_private_urls: bool,
    /// If set, only source URLs on these hosts (or their subdomains) are fetched
    pub url_allowlist: Option<Vec<String>>,
}

impl FilterServiceConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(get: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = BaseConfig::from_vars(&get, "FILTER_PORT", FILTER_PORT)?;

        let max_input_mb: usize = parse_or(&get, "FILTER_MAX_INPUT_MB", FILTER_MAX_INPUT_MB)?;
        let allow_private_urls = parse_or(&get, "FILTER_ALLOW_PRIVATE_URLS", !base.is_production())?;

        let url_allowlist = get("FILTER_URL_ALLOWLIST")
            .map(|raw| split_csv(&raw))
            .filter(|list| !list.is_empty());

        let config = Self {
            fetch_timeout_secs: parse_or(&get, "FILTER_FETCH_TIMEOUT_SECS", FILTER_FETCH_TIMEOUT_SECS)?,
            max_input_bytes: max_input_mb * 1024 * 1024,
            output_size: parse_or(&get, "FILTER_OUTPUT_SIZE", FILTER_OUTPUT_SIZE)?,
            jpeg_quality: parse_or(&get, "FILTER_JPEG_QUALITY", FILTER_JPEG_QUALITY)?,
            allow_private_urls,
            url_allowlist,
            base,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.output_size == 0 || self.output_size > 4096 {
            return Err(anyhow::anyhow!("FILTER_OUTPUT_SIZE must be between 1 and 4096"));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow::anyhow!("FILTER_JPEG_QUALITY must be between 1 and 100"));
        }
        if self.max_input_bytes == 0 {
            return Err(anyhow::anyhow!("FILTER_MAX_INPUT_MB must be greater than 0"));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T, anyhow::Error>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid value for {}: {} ({})", key, raw, e)),
        None => Ok(default),
    }
}

/// Accept `host[:port]` as well as full URLs; strip trailing slashes.
fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("http://{}", trimmed)
    }
}
