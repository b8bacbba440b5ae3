//! Global context for Gantry operations.
//!
//! Pins every operation to the repository root, so results do not depend on
//! the directory the tool was invoked from, and carries the loaded
//! configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use miette::Diagnostic;
use thiserror::Error;

use crate::util::config::{global_config_path, load_config, Config, MANIFEST_NAME};

/// Process-wide settings shared by all commands.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Directory the tool was invoked from
    cwd: PathBuf,

    /// Repository root (holds `Gantry.toml` or `.git`)
    root: PathBuf,

    /// Merged configuration
    config: Config,
}

impl GlobalContext {
    /// Discover the repository root starting at `cwd`.
    pub fn discover(cwd: PathBuf) -> Result<Self> {
        let root = find_root(&cwd)?;
        Self::with_root(cwd, root)
    }

    /// Use an explicit repository root.
    pub fn with_root(cwd: PathBuf, root: PathBuf) -> Result<Self> {
        if !root.is_dir() {
            bail!("repository root is not a directory: {}", root.display());
        }
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve {}", root.display()))?;

        let global = global_config_path();
        let config = load_config(global.as_deref(), &root.join(MANIFEST_NAME))?;

        Ok(GlobalContext { cwd, root, config })
    }

    /// Replace the configuration (used by tests and CLI overrides).
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Get the directory the tool was invoked from.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get mutable configuration for CLI overrides.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Get the build directory.
    pub fn build_dir(&self) -> PathBuf {
        self.config.build_dir(&self.root)
    }

    /// Path of the build-info manifest consumed by packaging.
    pub fn build_info_path(&self) -> PathBuf {
        self.build_dir().join("build-info.json")
    }
}

/// No repository root above the starting directory.
#[derive(Debug, Error, Diagnostic)]
#[error("could not find `{manifest}` or a git repository in `{start}` or any parent directory")]
#[diagnostic(
    code(gantry::root_not_found),
    help("run gantry inside the project repository, or pass `--root <DIR>`")
)]
pub struct RootNotFound {
    pub manifest: &'static str,
    pub start: PathBuf,
}

/// Walk up from `start` to the nearest directory holding `Gantry.toml`,
/// falling back to the nearest one holding `.git`.
pub fn find_root(start: &Path) -> Result<PathBuf> {
    if let Some(dir) = start
        .ancestors()
        .find(|dir| dir.join(MANIFEST_NAME).is_file())
    {
        return Ok(dir.to_path_buf());
    }

    if let Some(dir) = start.ancestors().find(|dir| dir.join(".git").exists()) {
        return Ok(dir.to_path_buf());
    }

    Err(RootNotFound {
        manifest: MANIFEST_NAME,
        start: start.to_path_buf(),
    }
    .into())
}
