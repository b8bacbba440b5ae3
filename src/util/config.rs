//! Configuration file support for Gantry.
//!
//! Gantry reads two configuration file locations:
//! - Global: `~/.gantry/config.toml` - User-wide defaults
//! - Project: `Gantry.toml` at the repository root - Project settings
//!
//! Project config takes precedence over global config. Tables are merged
//! key by key, so a project file only needs the keys it overrides.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::artifact::expand_url;
use crate::core::{BuildVariant, DependencyArtifact};
use crate::sources::describe::DescribeBackend;

/// Project configuration file name.
pub const MANIFEST_NAME: &str = "Gantry.toml";

/// Gantry configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version derivation settings
    pub version: VersionConfig,

    /// Third-party dependency settings
    pub dependency: DependencyConfig,

    /// License bundling settings
    pub licenses: LicensesConfig,

    /// Native build settings
    pub native: NativeConfig,

    /// Network settings
    pub net: NetConfig,

    /// Output locations
    pub build: BuildConfig,
}

/// Version derivation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Tag glob passed to the describe query
    pub tag_pattern: String,

    /// Describe implementation (git, libgit2)
    pub backend: DescribeBackend,
}

impl Default for VersionConfig {
    fn default() -> Self {
        VersionConfig {
            tag_pattern: "v*".to_string(),
            backend: DescribeBackend::Git,
        }
    }
}

/// Third-party source dependency settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependencyConfig {
    /// Dependency name, also the unpacked directory prefix
    pub name: String,

    /// Declared version, substituted into `url`
    pub version: String,

    /// Archive URL template; `{version}` is replaced
    pub url: String,

    /// Marker file relative to the expected path
    pub marker: PathBuf,

    /// Expected pre-provisioned location (relative to the repository root)
    pub path: Option<PathBuf>,

    /// Pinned SHA-256 of the archive
    pub sha256: Option<String>,
}

impl Default for DependencyConfig {
    fn default() -> Self {
        DependencyConfig {
            name: "eigen".to_string(),
            version: "3.4.0".to_string(),
            url: "https://gitlab.com/libeigen/eigen/-/archive/{version}/eigen-{version}.tar.gz"
                .to_string(),
            marker: PathBuf::from("Core"),
            path: None,
            sha256: None,
        }
    }
}

/// License bundling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensesConfig {
    /// Directory containing license files (relative to the repository root)
    pub source_dir: PathBuf,

    /// Glob selecting license files
    pub include: String,

    /// Output directory (defaults under the build directory)
    pub output_dir: Option<PathBuf>,
}

impl Default for LicensesConfig {
    fn default() -> Self {
        LicensesConfig {
            source_dir: PathBuf::from("LICENSES"),
            include: "*".to_string(),
            output_dir: None,
        }
    }
}

/// Native build settings shared by both variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeConfig {
    /// Minimum platform API level
    pub platform: u32,

    /// Standard-library flavor
    pub stl: String,

    /// Hardware-acceleration definitions (`NAME=VALUE`)
    pub acceleration: Vec<String>,

    /// CMake variable that receives the dependency include path
    pub include_var: String,

    /// CMake option toggled by the variant
    pub feature_flag: String,

    /// Target built by every variant
    pub primary_target: String,

    /// Service daemon target, out-of-process only
    pub service_target: String,

    /// Base application id
    pub application_id: String,

    /// Native source directory (relative to the repository root)
    pub source_dir: PathBuf,

    /// Display names per variant
    pub display_names: DisplayNames,
}

impl Default for NativeConfig {
    fn default() -> Self {
        NativeConfig {
            platform: 26,
            stl: "c++_shared".to_string(),
            acceleration: vec!["ANDROID_ARM_NEON=TRUE".to_string()],
            include_var: "EIGEN3_INCLUDE_DIR".to_string(),
            feature_flag: "XRT_FEATURE_SERVICE".to_string(),
            primary_target: "openxr_monado".to_string(),
            service_target: "monado-service".to_string(),
            application_id: "org.freedesktop.monado.openxr_runtime".to_string(),
            source_dir: PathBuf::from("."),
            display_names: DisplayNames::default(),
        }
    }
}

/// User-visible application names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayNames {
    pub in_process: String,
    pub out_of_process: String,
}

impl Default for DisplayNames {
    fn default() -> Self {
        DisplayNames {
            in_process: "Monado XR (In-Process)".to_string(),
            out_of_process: "Monado XR".to_string(),
        }
    }
}

impl DisplayNames {
    pub fn for_variant(&self, variant: BuildVariant) -> &str {
        match variant {
            BuildVariant::InProcess => &self.in_process,
            BuildVariant::OutOfProcess => &self.out_of_process,
        }
    }
}

/// Network-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Download timeout in seconds
    pub timeout_secs: u64,

    /// Offline mode (don't fetch from network)
    pub offline: bool,
}

impl Default for NetConfig {
    fn default() -> Self {
        NetConfig {
            timeout_secs: 300,
            offline: false,
        }
    }
}

/// Output locations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build directory (relative to the repository root)
    pub dir: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            dir: PathBuf::from("build/gantry"),
        }
    }
}

impl Config {
    /// Resolve a path relative to the repository root.
    fn resolve(root: &Path, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            root.join(path)
        }
    }

    /// Absolute build directory.
    pub fn build_dir(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.build.dir)
    }

    /// Absolute license source directory.
    pub fn license_source_dir(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.licenses.source_dir)
    }

    /// Absolute license output directory.
    pub fn license_output_dir(&self, root: &Path) -> PathBuf {
        match self.licenses.output_dir {
            Some(ref dir) => Self::resolve(root, dir),
            None => self
                .build_dir(root)
                .join("generated")
                .join("licenses")
                .join("raw"),
        }
    }

    /// Absolute native source directory.
    pub fn native_source_dir(&self, root: &Path) -> PathBuf {
        Self::resolve(root, &self.native.source_dir)
    }

    /// Build the artifact description for the configured dependency.
    pub fn dependency_artifact(&self, root: &Path) -> Result<DependencyArtifact> {
        let dep = &self.dependency;
        let remote_url = expand_url(&dep.url, &dep.version)
            .with_context(|| format!("invalid dependency url: {}", dep.url))?;

        let expected_path = match dep.path {
            Some(ref path) => Self::resolve(root, path),
            None => root.join("src").join("external").join(&dep.name),
        };

        let intermediates = self.build_dir(root).join("intermediates");
        let archive_name = remote_url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}-{}.tar.gz", dep.name, dep.version));

        Ok(DependencyArtifact {
            name: dep.name.clone(),
            version: dep.version.clone(),
            expected_path,
            marker: dep.marker.clone(),
            remote_url,
            local_archive_path: intermediates.join(archive_name),
            unpack_dir: intermediates.join(&dep.name),
            sha256: dep.sha256.clone(),
        })
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (Gantry.toml)
/// 2. Global config (~/.gantry/config.toml)
/// 3. Defaults
///
/// A file that exists but fails to parse is an error.
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Result<Config> {
    let mut merged = toml::Table::new();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            merge_tables(&mut merged, load_table(global_path)?);
        }
    }

    if project_path.exists() {
        merge_tables(&mut merged, load_table(project_path)?);
    }

    toml::Value::Table(merged)
        .try_into()
        .context("failed to parse merged configuration")
}

/// Get the global gantry config directory (~/.gantry).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".gantry"))
}

/// Get the global config path (~/.gantry/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

fn load_table(path: &Path) -> Result<toml::Table> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    contents
        .parse::<toml::Table>()
        .with_context(|| format!("failed to parse config file: {}", path.display()))
}

/// Merge `other` into `base`; nested tables merge, everything else replaces.
fn merge_tables(base: &mut toml::Table, other: toml::Table) {
    for (key, value) in other {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
