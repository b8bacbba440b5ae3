//! Version-control describe queries.
//!
//! A describe query names the most recent reachable tag matching a pattern
//! and expresses the current position as tag, commit distance, and
//! abbreviated commit hash. Two implementations are provided: spawning the
//! `git` CLI, and libgit2 through `git2`. Both are pinned to the repository
//! root they were created with.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::{DescribeFormatOptions, DescribeOptions, Repository};
use serde::{Deserialize, Serialize};

use crate::util::process::{find_git, ProcessBuilder};

/// Suffix appended when the working tree has uncommitted changes.
pub const DIRTY_SUFFIX: &str = "-dirty";

/// Parameters of one describe query. `--always` is implied.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DescribeQuery {
    /// Always emit the long form (`tag-N-gHASH`), even on an exact tag.
    pub long: bool,

    /// Append [`DIRTY_SUFFIX`] for a modified working tree.
    pub dirty: bool,

    /// Only consider tags matching this glob.
    pub pattern: String,
}

impl DescribeQuery {
    /// Strict long-form query used for version codes.
    pub fn long(pattern: impl Into<String>) -> Self {
        DescribeQuery {
            long: true,
            dirty: false,
            pattern: pattern.into(),
        }
    }

    /// Lenient dirty-aware query used for version strings.
    pub fn dirty(pattern: impl Into<String>) -> Self {
        DescribeQuery {
            long: false,
            dirty: true,
            pattern: pattern.into(),
        }
    }

    /// Arguments for `git`.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec!["describe".to_string(), "--always".to_string()];
        if self.long {
            args.push("--long".to_string());
        }
        if self.dirty {
            args.push("--dirty".to_string());
        }
        args.push("--match".to_string());
        args.push(self.pattern.clone());
        args
    }
}

/// Something that can answer describe queries.
///
/// An `Err` means the query could not run at all (tool missing, not a
/// repository, no commits); callers treat it as "no version available".
pub trait Describe: Send + Sync {
    fn describe(&self, query: &DescribeQuery) -> Result<String>;
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe(&self, query: &DescribeQuery) -> Result<String> {
        (**self).describe(query)
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe(&self, query: &DescribeQuery) -> Result<String> {
        (**self).describe(query)
    }
}

/// Which describe implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescribeBackend {
    /// Spawn the `git` executable.
    #[default]
    Git,
    /// Use libgit2 in-process.
    #[serde(rename = "libgit2")]
    LibGit2,
}

impl std::str::FromStr for DescribeBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "git" => Ok(DescribeBackend::Git),
            "libgit2" | "git2" => Ok(DescribeBackend::LibGit2),
            _ => Err(format!(
                "invalid describe backend '{}'; expected 'git' or 'libgit2'",
                s
            )),
        }
    }
}

impl DescribeBackend {
    /// Create the describer for `root`.
    pub fn describer(self, root: &Path) -> Box<dyn Describe> {
        match self {
            DescribeBackend::Git => Box::new(GitCommand::new(root)),
            DescribeBackend::LibGit2 => Box::new(LibGit::new(root)),
        }
    }
}

/// Runs `git describe` with the repository root as working directory.
#[derive(Debug, Clone)]
pub struct GitCommand {
    root: PathBuf,
    program: Option<PathBuf>,
}

impl GitCommand {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        GitCommand {
            root: root.into(),
            program: None,
        }
    }

    /// Use a specific git executable instead of searching `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }
}

impl Describe for GitCommand {
    fn describe(&self, query: &DescribeQuery) -> Result<String> {
        let program = match self.program {
            Some(ref program) => program.clone(),
            None => find_git().context("git executable not found in PATH")?,
        };

        let output = ProcessBuilder::new(program)
            .args(query.to_args())
            .cwd(&self.root)
            .env("LC_ALL", "C")
            .exec_and_check()?;

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            bail!("git describe produced no output");
        }

        tracing::debug!("git {} -> {}", query.to_args().join(" "), text);
        Ok(text)
    }
}

/// Answers describe queries through libgit2.
#[derive(Debug, Clone)]
pub struct LibGit {
    root: PathBuf,
}

impl LibGit {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LibGit { root: root.into() }
    }
}

impl Describe for LibGit {
    fn describe(&self, query: &DescribeQuery) -> Result<String> {
        let repo = Repository::open(&self.root)
            .with_context(|| format!("failed to open repository at {}", self.root.display()))?;

        let mut opts = DescribeOptions::new();
        opts.pattern(&query.pattern)
            .show_commit_oid_as_fallback(true);

        let describe = repo.describe(&opts).context("describe failed")?;

        let mut format = DescribeFormatOptions::new();
        if query.long {
            format.always_use_long_format(true);
        }
        if query.dirty {
            format.dirty_suffix(DIRTY_SUFFIX);
        }

        let text = describe
            .format(Some(&format))
            .context("failed to format describe result")?;

        tracing::debug!("libgit2 describe {:?} -> {}", query, text);
        Ok(text.trim().to_string())
    }
}
