// src/config.rs
//! Process configuration read from environment variables (a `.env` file is
//! loaded first when present).

use crate::store::DEFAULT_PAGE_SIZE;
use log::LevelFilter;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Scylla,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(pub String);

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(StoreBackend::Memory),
            "scylla" => Ok(StoreBackend::Scylla),
            other => Err(ConfigError(format!("unknown STORE_BACKEND '{}'", other))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_address: String,
    pub port: u16,
    pub backend: StoreBackend,
    pub scylla_node: String,
    pub keyspace: String,
    pub page_size: usize,
    pub log_level: LevelFilter,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: 3030,
            backend: StoreBackend::Memory,
            scylla_node: "127.0.0.1:9042".to_string(),
            keyspace: "stock_tracker".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            log_level: LevelFilter::Info,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None => defaults.backend,
        };

        Ok(Self {
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            port: lookup("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            backend,
            scylla_node: lookup("SCYLLA_NODE").unwrap_or(defaults.scylla_node),
            keyspace: lookup("SCYLLA_KEYSPACE").unwrap_or(defaults.keyspace),
            page_size: lookup("LIST_PAGE_SIZE")
                .and_then(|v| v.parse().ok())
                .filter(|size: &usize| *size > 0)
                .unwrap_or(defaults.page_size),
            log_level: lookup("LOG_LEVEL")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.log_level),
        })
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}
