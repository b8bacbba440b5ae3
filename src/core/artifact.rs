//! Third-party source artifact description.

use std::path::PathBuf;

use serde::Serialize;
use url::Url;

/// A downloadable third-party source artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyArtifact {
    /// Artifact name, used for the unpacked root directory (`<name>-<version>`).
    pub name: String,

    /// Declared version; part of the remote URL and the unpacked root name.
    pub version: String,

    /// Where a pre-provisioned copy is expected to live.
    pub expected_path: PathBuf,

    /// Marker file, relative to `expected_path`.
    pub marker: PathBuf,

    /// Archive to fetch when the marker is absent.
    pub remote_url: Url,

    /// Staging path for the downloaded archive.
    pub local_archive_path: PathBuf,

    /// Staging directory the archive is unpacked into.
    pub unpack_dir: PathBuf,

    /// Expected SHA-256 of the archive, if pinned.
    pub sha256: Option<String>,
}

/// Whether an artifact is already provisioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactState {
    Present,
    Absent,
}

impl DependencyArtifact {
    /// Full path of the marker file.
    pub fn marker_path(&self) -> PathBuf {
        self.expected_path.join(&self.marker)
    }

    /// Check the marker file. Never touches the network.
    pub fn state(&self) -> ArtifactState {
        if self.marker_path().is_file() {
            ArtifactState::Present
        } else {
            ArtifactState::Absent
        }
    }

    /// Name of the directory the archive unpacks to.
    pub fn root_dir_name(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Path to the unpacked artifact root.
    pub fn unpacked_root(&self) -> PathBuf {
        self.unpack_dir.join(self.root_dir_name())
    }

    /// Include path provisioning resolves to in the current state, without
    /// provisioning anything.
    pub fn include_path(&self) -> PathBuf {
        match self.state() {
            ArtifactState::Present => self.expected_path.clone(),
            ArtifactState::Absent => self.unpacked_root(),
        }
    }
}

/// Substitute `{version}` in a URL template and parse it.
pub fn expand_url(template: &str, version: &str) -> Result<Url, url::ParseError> {
    Url::parse(&template.replace("{version}", version))
}
