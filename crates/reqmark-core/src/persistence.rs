//! Persisting annotations to a per-project JSON file

use std::path::{Path, PathBuf};

use eyre::{Result, WrapErr};
use tracing::{debug, info};

use crate::annotation::Annotation;

/// Settings directory used when none is configured
pub const DEFAULT_SETTINGS_DIR: &str = ".vscode";

/// File name used when none is configured
pub const DEFAULT_FILE_NAME: &str = "annotations.json";

/// Where annotations are loaded from and flushed to.
///
/// The whole list is read and written at once.
pub trait Storage {
    fn load(&self) -> Result<Vec<Annotation>>;

    fn save(&self, annotations: &[Annotation]) -> Result<()>;
}

/// JSON array on disk, one object per annotation
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: Option<PathBuf>,
}

impl JsonFileStorage {
    /// Storage at an explicit file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// `<project_root>/<settings_dir>/<file_name>`
    pub fn for_project(project_root: &Path, settings_dir: &str, file_name: &str) -> Self {
        Self::new(project_root.join(settings_dir).join(file_name))
    }

    /// Storage with no workspace folder behind it.
    ///
    /// Loads nothing and refuses to save.
    pub fn detached() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Storage for JsonFileStorage {
    fn load(&self) -> Result<Vec<Annotation>> {
        let Some(path) = &self.path else {
            info!("No workspace folder found, starting without annotations");
            return Ok(Vec::new());
        };

        if !path.exists() {
            info!("No annotations file found at {}", path.display());
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("Failed to read annotations from {}", path.display()))?;
        let annotations: Vec<Annotation> = serde_json::from_str(&content)
            .wrap_err_with(|| format!("Failed to parse annotations file {}", path.display()))?;

        info!(
            "Loaded {} annotations from {}",
            annotations.len(),
            path.display()
        );
        Ok(annotations)
    }

    fn save(&self, annotations: &[Annotation]) -> Result<()> {
        let Some(path) = &self.path else {
            eyre::bail!("No workspace folder found, annotations not saved");
        };

        if let Some(dir) = path.parent()
            && !dir.exists()
        {
            std::fs::create_dir_all(dir)
                .wrap_err_with(|| format!("Failed to create {}", dir.display()))?;
            debug!("Created settings directory {}", dir.display());
        }

        let json = serde_json::to_string_pretty(annotations)
            .wrap_err("Failed to serialize annotations")?;
        std::fs::write(path, json)
            .wrap_err_with(|| format!("Failed to write annotations to {}", path.display()))?;

        debug!("Saved {} annotations to {}", annotations.len(), path.display());
        Ok(())
    }
}
