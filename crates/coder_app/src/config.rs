use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use coder_core::AutocodeThresholds;
use coder_engine::{HttpSettings, SyncSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::logging::LogDestination;

pub const DEFAULT_CONFIG_FILE: &str = "coder.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file {0:?} not found")]
    NotFound(PathBuf),
    #[error("failed to read {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Settings read from `coder.ron`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub classifier_url: String,
    /// Base URL of the session service; remote mirroring is off when unset.
    pub session_url: Option<String>,
    pub storage_dir: PathBuf,
    pub chunk_size: usize,
    pub max_attempts: u32,
    pub backoff_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub max_response_bytes: u64,
    pub autocode: AutocodeThresholds,
    pub log_destination: LogDestination,
}

impl Default for AppConfig {
    fn default() -> Self {
        let sync = SyncSettings::default();
        let http = HttpSettings::default();
        Self {
            classifier_url: "http://127.0.0.1:5000/classify".to_string(),
            session_url: None,
            storage_dir: PathBuf::from(".coder_state"),
            chunk_size: sync.chunk_size,
            max_attempts: sync.max_attempts,
            backoff_ms: duration_ms(sync.backoff),
            connect_timeout_ms: duration_ms(http.connect_timeout),
            request_timeout_ms: duration_ms(http.request_timeout),
            max_response_bytes: http.max_bytes,
            autocode: AutocodeThresholds::default(),
            log_destination: LogDestination::default(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            chunk_size: self.chunk_size,
            max_attempts: self.max_attempts,
            backoff: Duration::from_millis(self.backoff_ms),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
            max_bytes: self.max_response_bytes,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
