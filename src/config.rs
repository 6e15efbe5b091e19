//! Runtime configuration: optional TOML file, overridden by CLI flags.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

pub const DEFAULT_DATA_URL: &str =
    "https://github.com/boblandsky/onion_ml/raw/master/onion_resampled.csv";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub logistic: LogisticConfig,
    pub naive_bayes: NaiveBayesConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// HTTP(S) URL or local file path of the labeled CSV.
    pub source: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_DATA_URL.to_string(),
        }
    }
}

/// Pipeline A settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogisticConfig {
    pub seed: u64,
    pub test_fraction: f64,
    /// Inverse regularization strength.
    pub c: f64,
    pub learning_rate: f64,
    pub max_iter: usize,
    pub tolerance: f64,
}

impl Default for LogisticConfig {
    fn default() -> Self {
        Self {
            seed: 69,
            test_fraction: 0.25,
            c: 1.0,
            learning_rate: 1.0,
            max_iter: 1000,
            tolerance: 1e-4,
        }
    }
}

/// Pipeline B settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NaiveBayesConfig {
    pub seed: u64,
    /// 12600 of 18000 rows.
    pub train_fraction: f64,
}

impl Default for NaiveBayesConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            train_fraction: 0.7,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Live page sessions kept before the least recently used one is dropped.
    pub max_sessions: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
            max_sessions: 64,
        }
    }
}

impl Config {
    /// Load from a TOML file. Missing sections and keys fall back to defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
