//! Deployment settings loaded from TOML files
//!
//! Everything here is optional; a missing file means built-in defaults:
//! - Backend location and probe cadence
//! - The model catalog offered to clients
//! - Offline fallback delay and canned answers

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::catalog::ModelEntry;
use super::prompts::builtin;

/// Root settings file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Research backend settings
    #[serde(default)]
    pub backend: BackendSettings,

    /// Model catalog; empty means the built-in default model only
    #[serde(default)]
    pub models: Vec<ModelEntry>,

    /// Offline fallback behaviour
    #[serde(default)]
    pub offline: OfflineSettings,
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML string
    pub fn from_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.backend.probe_interval_secs == 0 {
            return Err(SettingsError::Validation(
                "backend.probe_interval_secs must be at least 1".into(),
            ));
        }
        if let Some(entry) = self.models.iter().find(|m| m.backend_id.trim().is_empty()) {
            return Err(SettingsError::Validation(format!(
                "model '{}' has an empty backend_id",
                entry.display_name
            )));
        }
        Ok(())
    }
}

/// Research backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Base URL; overrides `NEURO_API_URL` when set
    #[serde(default)]
    pub url: Option<String>,

    /// Seconds between reachability probes
    #[serde(default = "default_probe_interval")]
    pub probe_interval_secs: u64,

    /// Connect timeout for backend requests
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_probe_interval() -> u64 {
    30
}

impl BackendSettings {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: None,
            probe_interval_secs: default_probe_interval(),
            request_timeout_secs: None,
        }
    }
}

/// Offline fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfflineSettings {
    /// Delay before the local reply is shown
    #[serde(default = "default_offline_delay")]
    pub delay_ms: u64,

    /// Canned answers; empty means the built-in set
    #[serde(default)]
    pub answers: Vec<CannedAnswer>,
}

fn default_offline_delay() -> u64 {
    600
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            delay_ms: default_offline_delay(),
            answers: vec![],
        }
    }
}

/// A stored answer selected by topic keywords
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedAnswer {
    /// Case-insensitive substrings that select this answer
    pub topics: Vec<String>,

    /// Markdown answer text
    pub answer: String,
}

impl CannedAnswer {
    pub fn builtin() -> Vec<Self> {
        builtin::CANNED_ANSWERS
            .iter()
            .map(|(topics, answer)| Self {
                topics: topics.iter().map(|t| t.to_string()).collect(),
                answer: answer.to_string(),
            })
            .collect()
    }
}

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
