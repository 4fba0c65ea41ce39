//! reqmark library - requirement annotations for any editor with an LSP client
//!
//! This library exposes the server and its config for testing and
//! embedding purposes.

pub mod config;
pub mod host;
pub mod lsp;

use eyre::{Result, WrapErr};
use std::path::PathBuf;

/// Find the project root by walking up from the current directory.
///
/// A directory containing `.git` or `.vscode` counts as a root. Falls back
/// to the current directory.
pub fn find_project_root() -> Result<PathBuf> {
    let start = std::env::current_dir().wrap_err("Failed to get current directory")?;
    let mut current = start.clone();

    loop {
        if current.join(".git").exists() || current.join(".vscode").exists() {
            return Ok(current);
        }

        if !current.pop() {
            return Ok(start);
        }
    }
}
