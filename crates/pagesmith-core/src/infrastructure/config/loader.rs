use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use super::interpolation::{
    interpolate_toml,
    InterpolationError,
};
use super::schema::PagesmithConfig;

const LOCAL_CONFIG_FILE: &str = "pagesmith.toml";

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Environment variable interpolation failed: {0}")]
    InterpolationError(#[from] InterpolationError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ConfigLoadResult<T> = Result<T, ConfigLoadError>;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Finds the config file: `PAGESMITH_CONFIG_PATH`, then `./pagesmith.toml`,
    /// then the user config directory. `None` means run on defaults.
    pub fn discover_config_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("PAGESMITH_CONFIG_PATH") {
            tracing::debug!("Using config path from PAGESMITH_CONFIG_PATH: {}", path);
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            tracing::debug!("Using local config path: {}", local.display());
            return Some(local);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let path = config_dir.join("pagesmith").join("config.toml");
            if path.exists() {
                tracing::debug!("Using user config path: {}", path.display());
                return Some(path);
            }
        }

        None
    }

    /// Loads the discovered config, or defaults when there is none, then
    /// applies environment overrides.
    pub fn load_default() -> ConfigLoadResult<PagesmithConfig> {
        let mut config = match Self::discover_config_path() {
            Some(path) => Self::load(&path)?,
            None => {
                tracing::info!("No config file found, using defaults");
                PagesmithConfig::default()
            }
        };

        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    pub fn load(path: &Path) -> ConfigLoadResult<PagesmithConfig> {
        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> ConfigLoadResult<PagesmithConfig> {
        let mut value: toml::Value = toml::from_str(content)?;

        interpolate_toml(&mut value)?;

        let config: PagesmithConfig = value.try_into().map_err(|e| {
            ConfigLoadError::InvalidConfig(format!("Failed to deserialize config: {}", e))
        })?;

        tracing::debug!(
            queue_backend = %config.queue.backend,
            base_domain = %config.deploy.base_domain,
            "Loaded config"
        );

        Ok(config)
    }

    pub fn apply_env_overrides(config: &mut PagesmithConfig) {
        if let Ok(addr) = std::env::var("PAGESMITH_BIND_ADDR") {
            config.server.bind_addr = addr;
        }

        if let Ok(domain) = std::env::var("PAGESMITH_BASE_DOMAIN") {
            config.deploy.base_domain = domain;
        }

        if let Ok(url) = std::env::var("PAGESMITH_QUEUE_WEBHOOK_URL") {
            config.queue.webhook_url = Some(url);
        }
    }
}
