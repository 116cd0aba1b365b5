//! Global context for a deployment run.
//!
//! Captures the process environment once at start: the current directory,
//! the invoking user's home directory and the user configuration directory.
//! Everything downstream reads paths from here instead of the environment.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use thiserror::Error;

/// File that marks a project root.
pub const PROJECT_MANIFEST: &str = "Cargo.toml";

/// Project-local configuration file name.
pub const PROJECT_CONFIG: &str = "deploy.toml";

/// Directory name under the user configuration directory.
pub const APP_DIR: &str = "synctool-deploy";

/// Errors from resolving the working context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("could not find `{manifest}` in `{}` or any parent directory", .dir.display())]
    ProjectNotFound { manifest: &'static str, dir: PathBuf },

    #[error("could not determine the home directory")]
    NoHome,
}

/// Global context containing the paths a run is anchored to.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Home directory of the invoking user
    home: Option<PathBuf>,

    /// User configuration directory (e.g. ~/.config)
    config_dir: Option<PathBuf>,
}

impl GlobalContext {
    /// Create a new GlobalContext from the process environment.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let dirs = BaseDirs::new();

        Ok(GlobalContext {
            cwd,
            home: dirs.as_ref().map(|d| d.home_dir().to_path_buf()),
            config_dir: dirs.as_ref().map(|d| d.config_dir().to_path_buf()),
        })
    }

    /// Create a GlobalContext with explicit paths.
    pub fn with_paths(cwd: PathBuf, home: Option<PathBuf>, config_dir: Option<PathBuf>) -> Self {
        GlobalContext {
            cwd,
            home,
            config_dir,
        }
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the invoking user's home directory.
    pub fn home(&self) -> Result<&Path, ContextError> {
        self.home.as_deref().ok_or(ContextError::NoHome)
    }

    /// Get the global configuration file path, if a config dir is known.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Find the project root (directory containing Cargo.toml), starting
    /// from cwd and searching upward.
    pub fn find_project_root(&self) -> Result<PathBuf, ContextError> {
        let mut current = self.cwd.clone();
        loop {
            if current.join(PROJECT_MANIFEST).is_file() {
                return Ok(current);
            }
            if !current.pop() {
                return Err(ContextError::ProjectNotFound {
                    manifest: PROJECT_MANIFEST,
                    dir: self.cwd.clone(),
                });
            }
        }
    }

    /// Expand a leading `~` to the home directory.
    pub fn expand_home(&self, path: &Path) -> Result<PathBuf, ContextError> {
        let mut components = path.components();
        match components.next() {
            Some(Component::Normal(first)) if first == "~" => {
                Ok(self.home()?.join(components.as_path()))
            }
            _ => Ok(path.to_path_buf()),
        }
    }

    /// Expand `~` and anchor relative paths at `base`.
    pub fn resolve_path(&self, base: &Path, path: &Path) -> Result<PathBuf, ContextError> {
        let expanded = self.expand_home(path)?;
        if expanded.is_absolute() {
            Ok(expanded)
        } else {
            Ok(base.join(expanded))
        }
    }
}
