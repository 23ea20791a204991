//! Chain configuration, persisted as `config.json` in the data directory.

use linkchain_core::HEADER_VERSION;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Errors loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Transaction pool settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of transactions remembered by the pool.
    pub max_length: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self { max_length: 1000 }
    }
}

/// Block production settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    /// Maximum transactions per block.
    pub max_block_size: usize,
    /// Delay between produced blocks, in milliseconds.
    pub block_time_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            max_block_size: 1000,
            block_time_ms: 5000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Version written into produced headers.
    pub header_version: u32,
    pub pool: PoolConfig,
    pub producer: ProducerConfig,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            header_version: HEADER_VERSION,
            pool: PoolConfig::default(),
            producer: ProducerConfig::default(),
        }
    }
}

impl ChainConfig {
    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: ChainConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        self.validate()?;
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Reject limits that would make the pool or producer useless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pool.max_length == 0 {
            return Err(ConfigError::Invalid("pool.max_length must be > 0".into()));
        }
        if self.producer.max_block_size == 0 {
            return Err(ConfigError::Invalid(
                "producer.max_block_size must be > 0".into(),
            ));
        }
        Ok(())
    }
}
