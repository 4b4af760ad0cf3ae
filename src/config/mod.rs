//! Application configuration

pub mod catalog;
pub mod prompts;
pub mod settings;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use catalog::{ModelCatalog, ModelEntry, DEFAULT_MODEL};
pub use prompts::builtin as prompts_builtin;
pub use settings::{CannedAnswer, Settings, SettingsError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub api_url: String,
    pub model: String,
    pub data_dir: PathBuf,
    pub settings_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            api_url: env::var("NEURO_API_URL").unwrap_or_else(|_| "http://localhost:5000".into()),
            model: env::var("NEURO_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            data_dir: env::var("NEURO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            settings_path: env::var("NEURO_SETTINGS").ok().map(PathBuf::from),
        })
    }

    /// Settings file contents, or defaults when none is configured
    pub fn load_settings(&self) -> Result<Settings, SettingsError> {
        match &self.settings_path {
            Some(path) => Settings::from_file(path),
            None => Ok(Settings::default()),
        }
    }

    /// Backend URL, preferring the settings file over the environment
    pub fn backend_url<'a>(&'a self, settings: &'a Settings) -> &'a str {
        settings.backend.url.as_deref().unwrap_or(&self.api_url)
    }
}
