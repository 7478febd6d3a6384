//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first when
//! present). Every key is optional.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `UNPIVOT_HOST` | `0.0.0.0` |
//! | `UNPIVOT_PORT` | `3000` |
//! | `UNPIVOT_MAX_UPLOAD_MB` | `50` |
//! | `UNPIVOT_CACHE_ENTRIES` | `16` |
//! | `UNPIVOT_JOB_ENTRIES` | `64` |
//! | `UNPIVOT_PREVIEW_ROWS` | `50` |

use std::env;
use std::net::IpAddr;
use std::str::FromStr;

use crate::error::ConfigError;

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Maximum upload size in bytes.
    pub max_upload_bytes: usize,
    /// Memoized results kept by content hash.
    pub cache_entries: usize,
    /// Finished jobs kept for download.
    pub job_entries: usize,
    /// Rows returned inline after an upload.
    pub preview_rows: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
            max_upload_bytes: 50 * 1024 * 1024,
            cache_entries: 16,
            job_entries: 64,
            preview_rows: 50,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from any key lookup; missing keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            host: parse_or(&lookup, "UNPIVOT_HOST", defaults.host)?,
            port: parse_or(&lookup, "UNPIVOT_PORT", defaults.port)?,
            max_upload_bytes: parse_or(&lookup, "UNPIVOT_MAX_UPLOAD_MB", 50usize)?
                .saturating_mul(1024 * 1024),
            cache_entries: parse_or(&lookup, "UNPIVOT_CACHE_ENTRIES", defaults.cache_entries)?,
            job_entries: parse_or(&lookup, "UNPIVOT_JOB_ENTRIES", defaults.job_entries)?,
            preview_rows: parse_or(&lookup, "UNPIVOT_PREVIEW_ROWS", defaults.preview_rows)?,
        })
    }

    /// Override host and/or port (CLI flags).
    pub fn with_overrides(mut self, host: Option<IpAddr>, port: Option<u16>) -> Self {
        if let Some(h) = host {
            self.host = h;
        }
        if let Some(p) = port {
            self.port = p;
        }
        self
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
    }
}
