//! Conditional provisioning of the third-party source dependency.
//!
//! The marker file decides between two states. `Present` skips fetch and
//! unpack together; `Absent` downloads the archive to its staging path,
//! unpacks it, and resolves the versioned root directory.
//!
//! Known limitation: a present marker is trusted as-is. If the configured
//! version changes while an older copy is still present at the expected
//! path, the older copy is used without re-validation.

use std::path::PathBuf;

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::{ArtifactState, DependencyArtifact};
use crate::sources::archive::extract_archive;
use crate::sources::fetch::{FetchError, Fetcher};
use crate::util::fs::remove_dir_all_if_exists;
use crate::util::hash::sha256_file;

/// Provisioning failed; the native build cannot proceed.
#[derive(Debug, Error, Diagnostic)]
pub enum ProvisionError {
    #[error("`{name}` is not present at {expected} and offline mode is enabled")]
    #[diagnostic(
        code(gantry::provision::offline),
        help("disable offline mode or place the dependency at the expected path")
    )]
    Offline { name: String, expected: PathBuf },

    #[error("failed to download `{name}`")]
    #[diagnostic(
        code(gantry::provision::download),
        help("check your network connection or pre-provision the dependency")
    )]
    Download {
        name: String,
        #[source]
        source: FetchError,
    },

    #[error("checksum mismatch for {archive}:\n  expected: {expected}\n  actual:   {actual}")]
    #[diagnostic(code(gantry::provision::checksum))]
    Checksum {
        archive: PathBuf,
        expected: String,
        actual: String,
    },

    #[error("failed to verify checksum of {archive}")]
    #[diagnostic(code(gantry::provision::verify))]
    Verify {
        archive: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to extract {archive}")]
    #[diagnostic(code(gantry::provision::extract))]
    Extract {
        archive: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("archive did not unpack to the expected root {expected}")]
    #[diagnostic(
        code(gantry::provision::missing_root),
        help("the archive layout does not match `<name>-<version>/`")
    )]
    MissingRoot { expected: PathBuf },
}

/// What provisioning did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum ProvisionAction {
    /// Marker present: no network access, no extraction.
    Skipped,
    /// Archive downloaded and unpacked.
    Fetched { bytes: u64 },
}

/// Result of [`ArtifactProvisioner::ensure_artifact`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedArtifact {
    /// Directory the native build should include.
    pub path: PathBuf,

    /// State observed before any action was taken.
    pub state: ArtifactState,

    pub action: ProvisionAction,
}

/// Ensures the dependency exists locally.
pub struct ArtifactProvisioner<F> {
    fetcher: F,
    offline: bool,
}

impl<F: Fetcher> ArtifactProvisioner<F> {
    pub fn new(fetcher: F) -> Self {
        ArtifactProvisioner {
            fetcher,
            offline: false,
        }
    }

    /// Fail instead of downloading when the artifact is absent.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Resolve the artifact, fetching and unpacking only when absent.
    pub fn ensure_artifact(
        &self,
        artifact: &DependencyArtifact,
    ) -> Result<ResolvedArtifact, ProvisionError> {
        let state = artifact.state();
        match state {
            ArtifactState::Present => {
                tracing::debug!(
                    "{} found at {}; fetch and unpack skipped",
                    artifact.marker_path().display(),
                    artifact.expected_path.display()
                );
                Ok(ResolvedArtifact {
                    path: artifact.expected_path.clone(),
                    state,
                    action: ProvisionAction::Skipped,
                })
            }
            ArtifactState::Absent => {
                if self.offline {
                    return Err(ProvisionError::Offline {
                        name: artifact.name.clone(),
                        expected: artifact.expected_path.clone(),
                    });
                }

                let bytes = self.fetch(artifact)?;
                let path = self.unpack(artifact)?;
                Ok(ResolvedArtifact {
                    path,
                    state,
                    action: ProvisionAction::Fetched { bytes },
                })
            }
        }
    }

    fn fetch(&self, artifact: &DependencyArtifact) -> Result<u64, ProvisionError> {
        tracing::info!(
            "Fetching {} {} from {}",
            artifact.name,
            artifact.version,
            artifact.remote_url
        );

        let bytes = self
            .fetcher
            .fetch(&artifact.remote_url, &artifact.local_archive_path)
            .map_err(|source| ProvisionError::Download {
                name: artifact.name.clone(),
                source,
            })?;

        if let Some(ref expected) = artifact.sha256 {
            let archive = artifact.local_archive_path.clone();
            let actual = sha256_file(&archive).map_err(|source| ProvisionError::Verify {
                archive: archive.clone(),
                source,
            })?;
            if !actual.eq_ignore_ascii_case(expected) {
                // Never leave an archive that failed verification at the staging path.
                let _ = std::fs::remove_file(&archive);
                return Err(ProvisionError::Checksum {
                    archive,
                    expected: expected.clone(),
                    actual,
                });
            }
            tracing::debug!("Archive hash verified: {}", &actual[..16]);
        }

        Ok(bytes)
    }

    fn unpack(&self, artifact: &DependencyArtifact) -> Result<PathBuf, ProvisionError> {
        let archive = &artifact.local_archive_path;
        tracing::info!(
            "Extracting {} to {}",
            archive.display(),
            artifact.unpack_dir.display()
        );

        let root = artifact.unpacked_root();
        let extract_err = |source| ProvisionError::Extract {
            archive: archive.clone(),
            source,
        };

        // A previous unpack may have left files the new archive no longer has.
        remove_dir_all_if_exists(&root).map_err(extract_err)?;
        extract_archive(archive, &artifact.unpack_dir).map_err(extract_err)?;

        if !root.is_dir() {
            return Err(ProvisionError::MissingRoot { expected: root });
        }
        Ok(root)
    }
}
