//! Server configuration read from the environment.

use std::env;
use std::error::Error;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::ordered::ReorderPolicy;

pub const DEFAULT_PORT: u16 = 5000;

/// A configuration variable held a value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub variable: String,
    pub message: String,
}

impl ConfigError {
    fn new(variable: &str, message: impl Into<String>) -> Self {
        Self {
            variable: variable.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.variable, self.message)
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: IpAddr,
    pub port: u16,
    pub static_root: PathBuf,
    /// Bearer token for admin writes. `None` rejects every admin write.
    pub admin_token: Option<String>,
    pub data_path: Option<PathBuf>,
    pub seed_path: Option<PathBuf>,
    pub reorder_policy: ReorderPolicy,
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            static_root: PathBuf::from("."),
            admin_token: None,
            data_path: None,
            seed_path: None,
            reorder_policy: ReorderPolicy::default(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build a config from any variable source; unset or empty values fall
    /// back to defaults.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let addr = match var("PORTFOLIO_ADDR") {
            Some(v) => v
                .parse::<IpAddr>()
                .map_err(|e| ConfigError::new("PORTFOLIO_ADDR", e.to_string()))?,
            None => defaults.addr,
        };
        let port = match var("PORT") {
            Some(v) => v
                .parse::<u16>()
                .map_err(|e| ConfigError::new("PORT", e.to_string()))?,
            None => defaults.port,
        };
        let reorder_policy = match var("PORTFOLIO_REORDER_POLICY") {
            Some(v) => v
                .parse::<ReorderPolicy>()
                .map_err(|e| ConfigError::new("PORTFOLIO_REORDER_POLICY", e))?,
            None => defaults.reorder_policy,
        };
        let log_json = match var("PORTFOLIO_LOG_JSON") {
            Some(v) => parse_bool(&v).ok_or_else(|| {
                ConfigError::new("PORTFOLIO_LOG_JSON", format!("`{}` is not a boolean", v))
            })?,
            None => defaults.log_json,
        };

        Ok(Self {
            addr,
            port,
            static_root: var("PORTFOLIO_STATIC_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_root),
            admin_token: var("PORTFOLIO_ADMIN_TOKEN"),
            data_path: var("PORTFOLIO_DATA_PATH").map(PathBuf::from),
            seed_path: var("PORTFOLIO_SEED_PATH").map(PathBuf::from),
            reorder_policy,
            log_json,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
        "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
        _ => None,
    }
}
