use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{GpaError, Result};

// Defaults
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_DATA_DIR: &str = "database";
const DEFAULT_ADMIN_PIN: &str = "162019";
const DEFAULT_SESSION_TTL: u64 = 24 * 60 * 60; // 24 hours in seconds

/// How the admin PIN was supplied
#[derive(Debug, Clone, PartialEq)]
pub enum AdminPin {
    /// Argon2 PHC string
    Hash(String),
    /// Plain PIN, hashed once at startup
    Plain(String),
}

/// Runtime settings, read from `CGPA_*` environment variables
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: SocketAddr,
    pub data_dir: PathBuf,
    /// Course table override; the bundled table is used when unset
    pub catalog_path: Option<PathBuf>,
    pub admin_pin: AdminPin,
    pub session_ttl: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary variable source.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("CGPA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| GpaError::Config(format!("CGPA_BIND '{}': {}", bind_raw, e)))?;

        let data_dir = get("CGPA_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_DIR));
        let catalog_path = get("CGPA_CATALOG").map(PathBuf::from);

        let admin_pin = match (get("CGPA_ADMIN_PIN_HASH"), get("CGPA_ADMIN_PIN")) {
            (Some(hash), _) => AdminPin::Hash(hash.trim().to_string()),
            (None, Some(pin)) => AdminPin::Plain(pin.trim().to_string()),
            (None, None) => AdminPin::Plain(DEFAULT_ADMIN_PIN.to_string()),
        };

        let session_ttl = match get("CGPA_SESSION_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    GpaError::Config(format!("CGPA_SESSION_TTL_SECS '{}' is not a number", raw))
                })?;
                if secs == 0 {
                    return Err(GpaError::Config(
                        "CGPA_SESSION_TTL_SECS must be positive".to_string(),
                    ));
                }
                Duration::from_secs(secs)
            }
            None => Duration::from_secs(DEFAULT_SESSION_TTL),
        };

        Ok(Config {
            bind,
            data_dir,
            catalog_path,
            admin_pin,
            session_ttl,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: ([127, 0, 0, 1], 3000).into(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_path: None,
            admin_pin: AdminPin::Plain(DEFAULT_ADMIN_PIN.to_string()),
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL),
        }
    }
}
