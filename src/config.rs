//! Configuration structures and loading logic

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub api_port: u16,
    /// Register JSON document
    pub register_path: PathBuf,
    /// Directory holding one artifact per registered id
    pub store_dir: PathBuf,
    /// Overwrite the register with an empty one at start-up
    pub create_new_register: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            register_path: default_register_path(),
            store_dir: default_store_dir(),
            create_new_register: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse TOML config")?
        } else {
            Self::default()
        };

        // Environment variable overrides
        if let Ok(port) = std::env::var("TEXT_PIPELINER_API_PORT") {
            config.api_port = port
                .parse()
                .context("Invalid TEXT_PIPELINER_API_PORT value")?;
        }
        if let Ok(register_path) = std::env::var("TEXT_PIPELINER_REGISTER_PATH") {
            config.register_path = PathBuf::from(register_path);
        }
        if let Ok(store_dir) = std::env::var("TEXT_PIPELINER_STORE_DIR") {
            config.store_dir = PathBuf::from(store_dir);
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_port < 1024 {
            anyhow::bail!("API port must be >= 1024 (got {})", self.api_port);
        }

        if !self.store_dir.is_dir() {
            anyhow::bail!("Store directory {:?} is not a directory", self.store_dir);
        }

        if self.create_new_register {
            // Ensure register directory exists or can be created
            if let Some(parent) = self.register_path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Cannot create register directory: {:?}", parent)
                })?;
            }
        } else if !self.register_path.is_file() {
            anyhow::bail!("Register file {:?} does not exist", self.register_path);
        }

        Ok(())
    }
}

// Default functions
fn default_api_port() -> u16 {
    8080
}
fn default_register_path() -> PathBuf {
    PathBuf::from("./pipeliner/register.json")
}
fn default_store_dir() -> PathBuf {
    PathBuf::from("./pipeliner/store")
}
