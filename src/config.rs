//! Application configuration
//!
//! Values come from environment variables, each falling back to a default
//! with a warning. An optional YAML file overrides the environment.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-pro";
pub const DEFAULT_BUCKET_NAME: &str = "yt-sentiment-bucket";
pub const DEFAULT_MAX_COMMENTS: usize = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("{0} is required for this command")]
    Missing(&'static str),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub youtube_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    /// Root for the object bucket and the default warehouse file
    pub data_dir: PathBuf,
    pub bucket_name: String,
    pub warehouse_db: PathBuf,
    pub max_comments_to_fetch: usize,
}

/// Overrides read from a YAML file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    youtube_api_key: Option<String>,
    gemini_api_key: Option<String>,
    gemini_model: Option<String>,
    data_dir: Option<PathBuf>,
    bucket_name: Option<String>,
    warehouse_db: Option<PathBuf>,
    max_comments_to_fetch: Option<usize>,
}

/// Default data directory (~/.local/share/commentlens on Linux)
pub fn default_data_dir() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("commentlens")
}

impl AppConfig {
    /// Load from the process environment, then apply `file` if given.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::from_env();
        match file {
            Some(path) => config.with_file(path),
            None => Ok(config),
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let secret = |key: &'static str| {
            let value = var(key);
            if value.is_none() {
                warn!(variable = key, "Environment variable not set");
            }
            value
        };

        let or_default = |key: &'static str, default: &str| {
            var(key).unwrap_or_else(|| {
                warn!(variable = key, default, "Environment variable not set, using default");
                default.to_string()
            })
        };

        let max_comments_to_fetch = match var("MAX_COMMENTS_TO_FETCH") {
            None => DEFAULT_MAX_COMMENTS,
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(
                    variable = "MAX_COMMENTS_TO_FETCH",
                    value = %raw,
                    default = DEFAULT_MAX_COMMENTS,
                    "Invalid number, using default"
                );
                DEFAULT_MAX_COMMENTS
            }),
        };

        let data_dir = var("DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        let warehouse_db = var("WAREHOUSE_DB")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("warehouse.db"));

        Self {
            youtube_api_key: secret("YOUTUBE_API_KEY"),
            gemini_api_key: secret("GEMINI_API_KEY"),
            gemini_model: or_default("GEMINI_MODEL", DEFAULT_GEMINI_MODEL),
            bucket_name: or_default("BUCKET_NAME", DEFAULT_BUCKET_NAME),
            data_dir,
            warehouse_db,
            max_comments_to_fetch,
        }
    }

    /// Apply overrides from a YAML file.
    pub fn with_file(self, path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.with_yaml(&text)
    }

    fn with_yaml(mut self, text: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = serde_yaml::from_str(text)?;

        if file.youtube_api_key.is_some() {
            self.youtube_api_key = file.youtube_api_key;
        }
        if file.gemini_api_key.is_some() {
            self.gemini_api_key = file.gemini_api_key;
        }
        if let Some(model) = file.gemini_model {
            self.gemini_model = model;
        }
        if let Some(bucket) = file.bucket_name {
            self.bucket_name = bucket;
        }
        if let Some(max) = file.max_comments_to_fetch {
            self.max_comments_to_fetch = max;
        }
        // A new data dir moves the default warehouse with it, unless one is set explicitly.
        if let Some(dir) = file.data_dir {
            if self.warehouse_db == self.data_dir.join("warehouse.db") {
                self.warehouse_db = dir.join("warehouse.db");
            }
            self.data_dir = dir;
        }
        if let Some(db) = file.warehouse_db {
            self.warehouse_db = db;
        }
        Ok(self)
    }

    /// Directory acting as the object bucket.
    pub fn bucket_dir(&self) -> PathBuf {
        self.data_dir.join(&self.bucket_name)
    }

    pub fn require_youtube_key(&self) -> Result<&str, ConfigError> {
        self.youtube_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("YOUTUBE_API_KEY"))
    }

    pub fn require_gemini_key(&self) -> Result<&str, ConfigError> {
        self.gemini_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("GEMINI_API_KEY"))
    }
}
