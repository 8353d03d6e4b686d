use crate::domain::{
    config::{ControllerConfig, KhiTermConfig},
    error::{KhiTermError, KhiTermResult},
};
use std::path::{Path, PathBuf};
use std::fs;

/// Configuration manager
pub struct ConfigManager {
    global_config_path: PathBuf,
    project_config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create new configuration manager
    pub fn new() -> KhiTermResult<Self> {
        let global_config_path = Self::get_global_config_path()?;
        let project_config_path = std::env::current_dir()
            .ok()
            .and_then(|dir| Self::find_project_config_path(&dir));

        Ok(Self {
            global_config_path,
            project_config_path,
        })
    }

    /// Manager with explicit file locations
    pub fn with_paths(global_config_path: PathBuf, project_config_path: Option<PathBuf>) -> Self {
        Self {
            global_config_path,
            project_config_path,
        }
    }

    /// Load configuration from files
    pub fn load_config(&self) -> KhiTermResult<KhiTermConfig> {
        // Start with default configuration
        let mut config = KhiTermConfig::default();

        if self.global_config_path.exists() {
            config = self.parse_config(&self.global_config_path)?;
        }

        // Project file overrides the controller keys it sets and adds its own presets
        if let Some(project_path) = &self.project_config_path {
            if project_path.exists() {
                let content = read_config_file(project_path)?;
                let table: toml::Table = toml::from_str(&content).map_err(|e| parse_error(project_path, e))?;
                let project_config: KhiTermConfig = toml::from_str(&content).map_err(|e| parse_error(project_path, e))?;

                if let Some(toml::Value::Table(overrides)) = table.get("controller") {
                    config.controller = overlay_controller(&config.controller, overrides)?;
                }
                for preset in project_config.variables {
                    config.variables.retain(|existing| existing.name != preset.name);
                    config.variables.push(preset);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Get global configuration path
    fn get_global_config_path() -> KhiTermResult<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| KhiTermError::Config {
            message: "Could not determine home directory".to_string(),
        })?;

        Ok(home.join(".config").join("khiterm").join("config.toml"))
    }

    /// Find project configuration path by walking up directory tree
    fn find_project_config_path(start: &Path) -> Option<PathBuf> {
        let mut path = start;

        loop {
            let config_path = path.join(".khiterm").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            path = path.parent()?;
        }
    }

    /// Load and validate configuration from specific path
    pub fn load_config_from_path(&self, path: &Path) -> KhiTermResult<KhiTermConfig> {
        let config = self.parse_config(path)?;
        config.validate()?;
        Ok(config)
    }

    fn parse_config(&self, path: &Path) -> KhiTermResult<KhiTermConfig> {
        let content = read_config_file(path)?;
        toml::from_str(&content).map_err(|e| parse_error(path, e))
    }

    /// Save configuration to specific path
    pub fn save_config_to_path(&self, path: &Path, config: &KhiTermConfig) -> KhiTermResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| KhiTermError::Config {
                message: format!("Failed to create config directory: {}", e),
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| KhiTermError::Config {
            message: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| KhiTermError::Config {
            message: format!("Failed to write config file {}: {}", path.display(), e),
        })
    }

    /// Create default project configuration
    pub fn init_project_config(&self, path: &Path) -> KhiTermResult<PathBuf> {
        let config_file = path.join(".khiterm").join("config.toml");

        if config_file.exists() {
            return Err(KhiTermError::Config {
                message: "Project configuration already exists".to_string(),
            });
        }

        let default_config = KhiTermConfig {
            variables: KhiTermConfig::compensation_presets(),
            ..KhiTermConfig::default()
        };

        self.save_config_to_path(&config_file, &default_config)?;

        Ok(config_file)
    }

    /// Get the current project config path (if any)
    pub fn get_project_config_path(&self) -> Option<&PathBuf> {
        self.project_config_path.as_ref()
    }

    /// Get the global config path
    pub fn get_global_config_path_ref(&self) -> &PathBuf {
        &self.global_config_path
    }
}

fn read_config_file(path: &Path) -> KhiTermResult<String> {
    fs::read_to_string(path).map_err(|e| KhiTermError::Config {
        message: format!("Failed to read config file {}: {}", path.display(), e),
    })
}

fn parse_error(path: &Path, e: toml::de::Error) -> KhiTermError {
    KhiTermError::Config {
        message: format!("Failed to parse config file {}: {}", path.display(), e),
    }
}

/// Apply the keys of a `[controller]` table on top of an existing section
fn overlay_controller(base: &ControllerConfig, overrides: &toml::Table) -> KhiTermResult<ControllerConfig> {
    let serialize_error = |e: toml::ser::Error| KhiTermError::Config {
        message: format!("Failed to merge controller settings: {}", e),
    };
    let mut merged = match toml::Value::try_from(base).map_err(serialize_error)? {
        toml::Value::Table(table) => table,
        _ => toml::Table::new(),
    };
    merged.extend(overrides.clone());

    toml::Value::Table(merged).try_into().map_err(|e: toml::de::Error| KhiTermError::Config {
        message: format!("Failed to merge controller settings: {}", e),
    })
}
