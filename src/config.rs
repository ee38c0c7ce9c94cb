use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides the config file location
pub const CONFIG_PATH_VAR: &str = "HOSTEL_SCOUT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Header sets sent to the provider
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeaderProfile {
    /// Sent with catalog and detail GETs
    #[serde(default)]
    pub base_header: BTreeMap<String, String>,
    /// Sent with GraphQL POSTs
    #[serde(default)]
    pub data_header: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub max_retries: u32,
    pub retry_delay_seconds: f64,
    #[serde(rename = "max_num_of_threads")]
    pub max_workers: usize,
    pub graphql_url: String,
    pub duration_days: u32,
    pub get_hostels_url: String,
    pub hostel_id_url: String,
    pub headers: Vec<HeaderProfile>,
    #[serde(default = "default_raw_dir")]
    pub raw_dir: PathBuf,
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,
    #[serde(default)]
    pub request_timeout_seconds: Option<f64>,
    /// Set by `validate()` from `retry_delay_seconds`
    #[serde(skip)]
    pub retry_delay: Duration,
    /// Set by `validate()` from `request_timeout_seconds`
    #[serde(skip)]
    pub request_timeout: Option<Duration>,
}

fn default_raw_dir() -> PathBuf {
    PathBuf::from("raw")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("room_data.csv")
}

impl Config {
    /// Load from `$HOSTEL_SCOUT_CONFIG`, falling back to `config.json`
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(path)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field and store the checked durations
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Invalid("max_num_of_threads must be at least 1".into()));
        }
        if self.duration_days == 0 {
            return Err(ConfigError::Invalid("duration_days must be at least 1".into()));
        }
        let retry_delay = seconds("retry_delay_seconds", self.retry_delay_seconds)?;
        let request_timeout = match self.request_timeout_seconds {
            Some(secs) => {
                let timeout = seconds("request_timeout_seconds", secs)?;
                if timeout.is_zero() {
                    return Err(ConfigError::Invalid(
                        "request_timeout_seconds must be positive".into(),
                    ));
                }
                Some(timeout)
            }
            None => None,
        };
        if self.headers.is_empty() {
            return Err(ConfigError::Invalid("headers must contain one entry".into()));
        }
        for (name, url) in [
            ("graphql_url", &self.graphql_url),
            ("get_hostels_url", &self.get_hostels_url),
            ("hostel_id_url", &self.hostel_id_url),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{} must not be empty", name)));
            }
        }
        self.retry_delay = retry_delay;
        self.request_timeout = request_timeout;
        Ok(())
    }

    pub fn header_profile(&self) -> &HeaderProfile {
        // validate() guarantees at least one entry
        &self.headers[0]
    }

    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }
}

/// Non-negative, finite and small enough for a `Duration`
fn seconds(name: &str, secs: f64) -> Result<Duration, ConfigError> {
    Duration::try_from_secs_f64(secs).map_err(|e| {
        ConfigError::Invalid(format!("{} must be a non-negative number of seconds: {}", name, e))
    })
}
