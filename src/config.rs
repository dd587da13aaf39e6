use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::Result;
use crate::models::DEFAULT_PROJECT_COLOR;

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Store file; `TASKFLOW_DB` still takes precedence.
    pub data_file: Option<PathBuf>,

    /// Color assigned to projects created without one
    pub default_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_file: None,
            default_color: DEFAULT_PROJECT_COLOR.to_string(),
        }
    }
}

/// Location of the config file: `TASKFLOW_CONFIG`, else
/// `<config_dir>/taskflow/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TASKFLOW_CONFIG") {
        return Some(PathBuf::from(p));
    }
    dirs::config_dir().map(|mut p| {
        p.push("taskflow");
        p.push("config.toml");
        p
    })
}

/// Loads the config at `path`; a missing file yields the defaults.
pub fn load(path: &Path) -> eyre::Result<Config> {
    let Some(content) = read_file_content_if_exist(path)? else {
        return Ok(Config::default());
    };
    let config: Config = toml::from_str(&content)
        .map_err(|e| eyre::eyre!("invalid config '{}': {e}", path.display()))?;
    Ok(config)
}

fn read_file_content_if_exist(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    Ok(Some(content))
}
