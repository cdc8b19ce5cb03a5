//! Server settings, read from `SAM2_VIZ_*` environment variables.

use std::{net::SocketAddr, path::PathBuf};

use thiserror::Error;

pub const ENV_ADDR: &str = "SAM2_VIZ_ADDR";
pub const ENV_BODY_LIMIT_MB: &str = "SAM2_VIZ_BODY_LIMIT_MB";
pub const ENV_STATIC_DIR: &str = "SAM2_VIZ_STATIC_DIR";
pub const ENV_MAX_CONCURRENT: &str = "SAM2_VIZ_MAX_CONCURRENT";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key}: invalid value {value:?}: {reason}")]
    Invalid { key: &'static str, value: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
    /// Directory served for paths outside `/api` and `/docs`.
    pub static_dir: PathBuf,
    /// Upper bound on renders running at the same time.
    pub max_concurrent_renders: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4);
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            body_limit: 50 * 1024 * 1024,
            static_dir: PathBuf::from("sam2_viz/static"),
            max_concurrent_renders: cpus,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(v) = lookup(ENV_ADDR) {
            config.addr = v.parse().map_err(|e: std::net::AddrParseError| invalid(ENV_ADDR, &v, e))?;
        }
        if let Some(v) = lookup(ENV_BODY_LIMIT_MB) {
            let mb: usize = v.parse().map_err(|e: std::num::ParseIntError| invalid(ENV_BODY_LIMIT_MB, &v, e))?;
            if mb == 0 {
                return Err(invalid(ENV_BODY_LIMIT_MB, &v, "must be at least 1"));
            }
            config.body_limit = mb * 1024 * 1024;
        }
        if let Some(v) = lookup(ENV_STATIC_DIR) {
            config.static_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_MAX_CONCURRENT) {
            let n: usize = v.parse().map_err(|e: std::num::ParseIntError| invalid(ENV_MAX_CONCURRENT, &v, e))?;
            if n == 0 {
                return Err(invalid(ENV_MAX_CONCURRENT, &v, "must be at least 1"));
            }
            config.max_concurrent_renders = n;
        }
        Ok(config)
    }
}

fn invalid(key: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid { key, value: value.to_string(), reason: reason.to_string() }
}
