//! Application Configuration
//!
//! Stored as JSON (e.g. `site_qc_config.json` next to the app data).
//! Firestore settings can also come from `FIREBASE_*` environment variables.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
}

/// Firebase project settings. Only `project_id` is needed for Firestore;
/// the rest are carried so one config describes the whole Firebase app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirestoreConfig {
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_domain: Option<String>,
    #[serde(default)]
    pub storage_bucket: Option<String>,
    #[serde(default)]
    pub messaging_sender_id: Option<String>,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub measurement_id: Option<String>,
    #[serde(default)]
    pub database_url: Option<String>,
    /// REST endpoint override, e.g. a local emulator
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl FirestoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_fallback()
    }

    /// Build from any key lookup; empty values count as absent
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::default().with_fallback(lookup)
    }

    /// Settings missing from the config file are taken from `FIREBASE_*`
    /// environment variables
    pub fn with_env_fallback(&self) -> Result<Self, ConfigError> {
        self.with_fallback(|key| std::env::var(key).ok())
    }

    /// Fill unset fields from `lookup`. Values already set win.
    pub fn with_fallback(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let project_id = if self.project_id.trim().is_empty() {
            get("FIREBASE_PROJECT_ID").ok_or(ConfigError::MissingEnv("FIREBASE_PROJECT_ID"))?
        } else {
            self.project_id.clone()
        };
        let or = |value: &Option<String>, key: &str| value.clone().or_else(|| get(key));
        Ok(Self {
            project_id,
            api_key: or(&self.api_key, "FIREBASE_API_KEY"),
            auth_domain: or(&self.auth_domain, "FIREBASE_AUTH_DOMAIN"),
            storage_bucket: or(&self.storage_bucket, "FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: or(&self.messaging_sender_id, "FIREBASE_MESSAGING_SENDER_ID"),
            app_id: or(&self.app_id, "FIREBASE_APP_ID"),
            measurement_id: or(&self.measurement_id, "FIREBASE_MEASUREMENT_ID"),
            database_url: or(&self.database_url, "FIREBASE_DATABASE_URL"),
            endpoint: or(&self.endpoint, "FIRESTORE_ENDPOINT"),
        })
    }

    /// Which settings are set, without their values
    pub fn presence(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("projectId", !self.project_id.is_empty()),
            ("apiKey", self.api_key.is_some()),
            ("authDomain", self.auth_domain.is_some()),
            ("storageBucket", self.storage_bucket.is_some()),
            ("messagingSenderId", self.messaging_sender_id.is_some()),
            ("appId", self.app_id.is_some()),
        ]
    }
}

/// Where project documents live
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BackendConfig {
    #[default]
    Memory,
    Sqlite {
        path: PathBuf,
    },
    Firestore(FirestoreConfig),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default)]
    pub backend: BackendConfig,
    /// Local snapshot of the project list
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
    /// Rolling log files go here; no file logging when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_app_name() -> String {
    "SiteQC".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            backend: BackendConfig::default(),
            cache_path: None,
            log_dir: None,
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the file if it exists, otherwise the defaults
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(io_err)
    }
}
