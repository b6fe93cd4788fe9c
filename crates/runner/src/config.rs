//! Runner configuration
//!
//! Loaded from an optional JSON file, then overridden from the environment:
//!
//! - `TOLLGATE_CONFIG`: path of the JSON file
//! - `TOLLGATE_LOCK_TIMEOUT_MS`: lock wait bound before failing closed
//! - `TOLLGATE_MAX_POSITION`: default per-symbol position limit
//! - `TOLLGATE_CHANNEL_CAPACITY`: request queue depth
//! - `TOLLGATE_JOURNAL_PATH`: append the audit journal to this file
//!
//! Decimal fields are written as JSON strings (`"500"`).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tollgate_order_manager::{AdmissionConfig, FileJournal, InMemoryJournal, Journal, JournalError};

pub const CONFIG_PATH_VAR: &str = "TOLLGATE_CONFIG";
pub const LOCK_TIMEOUT_VAR: &str = "TOLLGATE_LOCK_TIMEOUT_MS";
pub const MAX_POSITION_VAR: &str = "TOLLGATE_MAX_POSITION";
pub const CHANNEL_CAPACITY_VAR: &str = "TOLLGATE_CHANNEL_CAPACITY";
pub const JOURNAL_PATH_VAR: &str = "TOLLGATE_JOURNAL_PATH";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {error}")]
    Io { path: String, error: String },

    #[error("Failed to parse config: {0}")]
    Parse(String),

    #[error("Invalid value for {var}: '{value}'")]
    Env { var: &'static str, value: String },

    #[error("Failed to open journal: {0}")]
    Journal(#[from] JournalError),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub admission: AdmissionConfig,
    /// Pending requests the service queue holds
    pub channel_capacity: usize,
    /// Client-side bound on each RPC
    pub request_timeout_ms: u64,
    /// JSON-lines journal file; in-memory when unset
    pub journal_path: Option<PathBuf>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            admission: AdmissionConfig::default(),
            channel_capacity: 1024,
            request_timeout_ms: 5_000,
            journal_path: None,
        }
    }
}

impl RunnerConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            error: e.to_string(),
        })?;

        Self::from_json(&content)
    }

    /// Parse configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// File named by `TOLLGATE_CONFIG` (or defaults), then env overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let lookup = |var: &str| std::env::var(var).ok();
        let mut config = match lookup(CONFIG_PATH_VAR) {
            Some(path) => {
                log::info!("Loading configuration from: {}", path);
                Self::from_file(path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment)
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(ms) = parse_var::<u64>(&lookup, LOCK_TIMEOUT_VAR)? {
            self.admission.lock_timeout_ms = ms;
        }
        if let Some(max) = parse_var::<Decimal>(&lookup, MAX_POSITION_VAR)? {
            self.admission.limits.default_instrument_limits.max_position = max;
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, CHANNEL_CAPACITY_VAR)? {
            self.channel_capacity = capacity;
        }
        if let Some(path) = lookup(JOURNAL_PATH_VAR).filter(|p| !p.trim().is_empty()) {
            self.journal_path = Some(PathBuf::from(path.trim()));
        }
        Ok(())
    }

    /// The configured audit sink: the journal file if set, else in memory
    pub fn open_journal(&self) -> Result<Arc<dyn Journal>, ConfigError> {
        Ok(match &self.journal_path {
            Some(path) => Arc::new(FileJournal::open(path)?),
            None => Arc::new(InMemoryJournal::new(self.admission.journal_capacity)),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Env { var, value }),
    }
}
