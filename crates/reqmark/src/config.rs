//! Configuration for reqmark
//!
//! Config lives at `.config/reqmark/config.json` relative to the project
//! root. Every field is optional.

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use reqmark_core::{DEFAULT_FILE_NAME, DEFAULT_SETTINGS_DIR, JsonFileStorage};
use serde::Deserialize;

/// Root configuration for reqmark
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory (relative to the project root) holding the annotations file
    pub settings_dir: String,

    /// Name of the annotations file inside `settings_dir`
    pub file_name: String,

    /// Colors offered by the color picker when a command carries none
    pub palette: Vec<String>,

    /// Color offered first when adding a new annotation
    pub default_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings_dir: DEFAULT_SETTINGS_DIR.to_string(),
            file_name: DEFAULT_FILE_NAME.to_string(),
            palette: ["#FF0000", "#00FF00", "#0000FF", "#FFFF00", "#FF00FF", "#00FFFF"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_color: "#FFFF00".to_string(),
        }
    }
}

impl Config {
    /// Storage for the annotations file of `project_root`
    pub fn storage(&self, project_root: &Path) -> JsonFileStorage {
        JsonFileStorage::for_project(project_root, &self.settings_dir, &self.file_name)
    }
}

/// Default config location for a project
pub fn config_path(project_root: &Path) -> PathBuf {
    project_root.join(".config/reqmark/config.json")
}

/// Load config from `path`, falling back to defaults when the file is absent
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read config from {}", path.display()))?;
    serde_json::from_str(&content)
        .wrap_err_with(|| format!("Failed to parse config file {}", path.display()))
}
