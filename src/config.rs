use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "LangExtract API";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum number of files accepted by the batch endpoint.
pub const MAX_BATCH_DOCUMENTS: usize = 10;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 25 * 1024 * 1024; // 25 MiB
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_JOB_RETENTION: usize = 1024;
const DEFAULT_EXTRACT_DELAY_MS: u64 = 1000;
const DEFAULT_OCR_DELAY_MS: u64 = 800;

/// Default tracing filter when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "langextract_api=info,tower_http=info"
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    InvalidValue {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Process-wide service configuration. Loaded once at startup, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Per-file upload limit.
    pub max_upload_bytes: u64,
    pub backend_timeout: Duration,
    /// Backend calls in flight for a single batch request.
    pub max_concurrent_extractions: usize,
    /// Finished jobs kept for status lookup before the oldest are evicted.
    pub job_retention: usize,
    pub extract_delay: Duration,
    pub ocr_delay: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            backend_timeout: Duration::from_secs(DEFAULT_BACKEND_TIMEOUT_SECS),
            max_concurrent_extractions: DEFAULT_MAX_CONCURRENCY,
            job_retention: DEFAULT_JOB_RETENTION,
            extract_delay: Duration::from_millis(DEFAULT_EXTRACT_DELAY_MS),
            ocr_delay: Duration::from_millis(DEFAULT_OCR_DELAY_MS),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unset or blank variables fall back to defaults; present but
    /// unparseable values are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let host = parse_var(get("HOST"), "HOST", defaults.host)?;
        let port = parse_var(get("PORT"), "PORT", defaults.port)?;
        let max_upload_bytes = parse_var(
            get("LANGEXTRACT_MAX_UPLOAD_BYTES"),
            "LANGEXTRACT_MAX_UPLOAD_BYTES",
            defaults.max_upload_bytes,
        )?;
        let timeout_secs = parse_var(
            get("LANGEXTRACT_BACKEND_TIMEOUT_SECS"),
            "LANGEXTRACT_BACKEND_TIMEOUT_SECS",
            DEFAULT_BACKEND_TIMEOUT_SECS,
        )?;
        let max_concurrent_extractions = parse_var(
            get("LANGEXTRACT_MAX_CONCURRENCY"),
            "LANGEXTRACT_MAX_CONCURRENCY",
            defaults.max_concurrent_extractions,
        )?;
        let job_retention = parse_var(
            get("LANGEXTRACT_JOB_RETENTION"),
            "LANGEXTRACT_JOB_RETENTION",
            defaults.job_retention,
        )?;
        let extract_delay_ms = parse_var(
            get("LANGEXTRACT_EXTRACT_DELAY_MS"),
            "LANGEXTRACT_EXTRACT_DELAY_MS",
            DEFAULT_EXTRACT_DELAY_MS,
        )?;
        let ocr_delay_ms = parse_var(
            get("LANGEXTRACT_OCR_DELAY_MS"),
            "LANGEXTRACT_OCR_DELAY_MS",
            DEFAULT_OCR_DELAY_MS,
        )?;

        require_positive("LANGEXTRACT_MAX_UPLOAD_BYTES", max_upload_bytes)?;
        require_positive("LANGEXTRACT_BACKEND_TIMEOUT_SECS", timeout_secs)?;
        require_positive(
            "LANGEXTRACT_MAX_CONCURRENCY",
            max_concurrent_extractions as u64,
        )?;
        require_positive("LANGEXTRACT_JOB_RETENTION", job_retention as u64)?;

        Ok(Self {
            host,
            port,
            max_upload_bytes,
            backend_timeout: Duration::from_secs(timeout_secs),
            max_concurrent_extractions,
            job_retention,
            extract_delay: Duration::from_millis(extract_delay_ms),
            ocr_delay: Duration::from_millis(ocr_delay_ms),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Request body ceiling: a full batch of maximum-size files plus
    /// multipart framing.
    pub fn body_limit(&self) -> usize {
        let files = self.max_upload_bytes.saturating_mul(MAX_BATCH_DOCUMENTS as u64);
        usize::try_from(files.saturating_add(1024 * 1024)).unwrap_or(usize::MAX)
    }
}

fn parse_var<T>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                name,
                value: value.clone(),
                reason: e.to_string(),
            }),
    }
}

fn require_positive(name: &'static str, value: u64) -> Result<(), ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(config.extract_delay, Duration::from_millis(1000));
        assert_eq!(config.ocr_delay, Duration::from_millis(800));
    }

    #[test]
    fn port_from_environment() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("PORT", "8080")])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.socket_addr().port(), 8080);
    }

    #[test]
    fn blank_value_uses_default() {
        let config = ServiceConfig::from_lookup(lookup_from(&[("PORT", "  ")])).unwrap();
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn invalid_port_rejected() {
        let err = ServiceConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { name, value, .. } => {
                assert_eq!(name, "PORT");
                assert_eq!(value, "eighty");
            }
        }
    }

    #[test]
    fn zero_concurrency_rejected() {
        let result =
            ServiceConfig::from_lookup(lookup_from(&[("LANGEXTRACT_MAX_CONCURRENCY", "0")]));
        assert!(result.is_err());
    }

    #[test]
    fn delays_configurable() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("LANGEXTRACT_EXTRACT_DELAY_MS", "0"),
            ("LANGEXTRACT_OCR_DELAY_MS", "5"),
        ]))
        .unwrap();
        assert_eq!(config.extract_delay, Duration::ZERO);
        assert_eq!(config.ocr_delay, Duration::from_millis(5));
    }

    #[test]
    fn body_limit_covers_full_batch() {
        let config = ServiceConfig::default();
        assert!(config.body_limit() as u64 > config.max_upload_bytes * 10);
    }

    #[test]
    fn app_name_is_langextract() {
        assert_eq!(APP_NAME, "LangExtract API");
    }
}
