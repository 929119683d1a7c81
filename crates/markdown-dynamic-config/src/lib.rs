use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// One `[[extension]]` entry: a script file and the options table handed
/// to its entry function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub file: String,
    #[serde(default = "empty_options")]
    pub options: toml::Value,
}

fn empty_options() -> toml::Value {
    toml::Value::Table(toml::map::Map::new())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Directory extension scripts (and their `require`d modules) are
    /// resolved against. Defaults to the config file's directory.
    #[serde(default)]
    pub script_dir: Option<PathBuf>,

    #[serde(default, rename = "extension")]
    pub extensions: Vec<ExtensionEntry>,
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        config.script_dir = match config.script_dir {
            Some(dir) => Some(Self::expand_path(&dir).unwrap_or(dir)),
            None => config_path.parent().map(Path::to_path_buf),
        };

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/markdown-dynamic");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
