use crate::domain::{
    config::LinkTermConfig,
    error::{LinkTermError, LinkTermResult},
};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    data_dir: PathBuf,
}

impl ConfigManager {
    /// Create new configuration manager rooted at the user's home directory
    pub fn new() -> LinkTermResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| LinkTermError::Config {
            message: "Could not determine home directory".to_string(),
        })?;
        Ok(Self::with_home(&home))
    }

    /// Configuration manager rooted at `home` instead of the real home directory
    pub fn with_home(home: &Path) -> Self {
        Self {
            global_config_path: home.join(".config").join("linkterm").join("config.toml"),
            data_dir: home.join(".linkterm"),
        }
    }

    /// Load the global configuration, falling back to defaults when absent
    pub fn load_config(&self) -> LinkTermResult<LinkTermConfig> {
        if self.global_config_path.exists() {
            self.load_config_from_path(&self.global_config_path)
        } else {
            Ok(LinkTermConfig::default())
        }
    }

    /// Load configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> LinkTermResult<LinkTermConfig> {
        let content = fs::read_to_string(path).map_err(|e| LinkTermError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        toml::from_str(&content).map_err(|e| LinkTermError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &LinkTermConfig) -> LinkTermResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| LinkTermError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| LinkTermError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| LinkTermError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Get the global config path
    pub fn global_config_path(&self) -> &Path {
        &self.global_config_path
    }

    /// Directory holding the received-line log and command history
    pub fn default_data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn default_log_file(&self) -> PathBuf {
        self.data_dir.join("log.txt")
    }

    pub fn default_history_file(&self) -> PathBuf {
        self.data_dir.join("history.txt")
    }
}
