//! Configuration file support for the lift log.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/nlw/config.toml`.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub vision: VisionConfig,

    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Workout backend
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_url")]
    pub url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Meal photo analysis endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_vision_model")]
    pub model: String,

    /// Image detail hint ("low", "high", "auto")
    #[serde(default = "default_vision_detail")]
    pub detail: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_vision_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            detail: default_vision_detail(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_vision_timeout_secs(),
        }
    }
}

impl VisionConfig {
    /// Read the API key from the configured environment variable
    pub fn api_key(&self) -> Result<String> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(format!(
                "API key not set: export {}",
                self.api_key_env
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Local data storage configuration
#[derive(Clone, Debug, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

impl DataConfig {
    pub fn credential_path(&self) -> PathBuf {
        self.data_dir.join("credential.json")
    }
}

/// Dashboard display configuration
#[derive(Clone, Debug, Deserialize)]
pub struct DashboardConfig {
    /// Category shown when none is requested
    #[serde(default)]
    pub default_category: Option<String>,

    /// Upper bound on labelled points along a chart's date axis
    #[serde(default = "default_max_chart_labels")]
    pub max_chart_labels: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            default_category: None,
            max_chart_labels: default_max_chart_labels(),
        }
    }
}

// Default value functions
fn default_server_url() -> String {
    "http://localhost:3000".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_vision_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}

fn default_vision_model() -> String {
    "gpt-4o".into()
}

fn default_vision_detail() -> String {
    "high".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

fn default_vision_timeout_secs() -> u64 {
    120
}

fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("nlw")
}

fn default_max_chart_labels() -> usize {
    6
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("nlw").join("config.toml")
    }

    /// Reject values that would only fail later at request time
    pub fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("server.url", &self.server.url),
            ("vision.endpoint", &self.vision.endpoint),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "{} must be an http(s) URL, got {:?}",
                    name, url
                )));
            }
        }
        if self.dashboard.max_chart_labels == 0 {
            return Err(Error::Config(
                "dashboard.max_chart_labels must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
