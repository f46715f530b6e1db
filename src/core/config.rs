//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::core::languages;

/// Application directory name under the platform config/data dirs
const APP_DIR: &str = "translator-pro";

/// Environment variable prefix, e.g. `TRANSLATOR_TARGET_LANG`
const ENV_PREFIX: &str = "TRANSLATOR";

/// Default translation endpoint
pub const DEFAULT_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

/// Configuration for the translator client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    pub api_endpoint: String,
    pub client_id: String,
    pub timeout_ms: u64,
    pub source_lang: String,
    pub target_lang: String,
    pub auto_translate: bool,
    pub debounce_ms: u64,
    pub status_ttl_ms: u64,
    pub data_dir: Option<PathBuf>,
    pub export_dir: Option<PathBuf>,
    pub speech_input_command: Option<String>,
    pub speech_output_command: Option<String>,
    pub clipboard_command: Option<String>,
    /// Use the native clipboard when no clipboard command is set
    pub system_clipboard: bool,
    pub share_command: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
            client_id: "gtx".to_string(),
            timeout_ms: 15000,
            source_lang: "auto".to_string(),
            target_lang: "ta".to_string(),
            auto_translate: false,
            debounce_ms: 800,
            status_ttl_ms: 3000,
            data_dir: None,
            export_dir: None,
            speech_input_command: None,
            speech_output_command: None,
            clipboard_command: None,
            system_clipboard: true,
            share_command: None,
        }
    }
}

impl TranslatorConfig {
    /// Load configuration: defaults, then the config file, then `TRANSLATOR_*` env vars
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os("TRANSLATOR_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut builder = config::Config::builder();
        if let Some(path) = &path {
            debug!("Config file candidate: {}", path.display());
            builder = builder.add_source(config::File::from(path.as_path()).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .ignore_empty(true),
        );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;

        info!(
            "Loaded configuration (endpoint: {}, {} -> {})",
            config.api_endpoint, config.source_lang, config.target_lang
        );
        Ok(config)
    }

    /// Load from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_endpoint.is_empty() {
            return Err(anyhow::anyhow!("API endpoint is required"));
        }

        if !languages::is_valid_source(&self.source_lang) {
            return Err(anyhow::anyhow!("Unknown source language: {}", self.source_lang));
        }

        if !languages::is_valid_target(&self.target_lang) {
            return Err(anyhow::anyhow!("Unknown target language: {}", self.target_lang));
        }

        if self.timeout_ms == 0 {
            return Err(anyhow::anyhow!("timeout_ms must be greater than 0"));
        }

        if self.status_ttl_ms == 0 {
            return Err(anyhow::anyhow!("status_ttl_ms must be greater than 0"));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn status_ttl(&self) -> Duration {
        Duration::from_millis(self.status_ttl_ms)
    }

    /// Directory holding the history and counter slots
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .map(|d| d.join(APP_DIR))
                .unwrap_or_else(|| PathBuf::from(".").join(format!(".{}", APP_DIR)))
        })
    }

    /// Directory exports are written to
    pub fn resolved_export_dir(&self) -> PathBuf {
        self.export_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
    }
}
