//! Build preparation.
//!
//! Runs every step that must finish before native compilation and hands
//! back one complete [`BuildContext`]:
//!
//! ```text
//!   version ──────────────────────────────┐
//!   licenses  ──┐                         ├──> BuildContext ──> build-info.json
//!   provision ──┴──> configure(variant) ──┘
//! ```
//!
//! Version derivation, license aggregation, and provisioning share no data
//! and run concurrently. An absent version never blocks; any other failure
//! aborts before a parameter set exists.
//!
//! Concurrent `prepare` runs against the same build directory are not
//! supported.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::{BuildVariant, NativeBuildParameters, VersionError};
use crate::ops::configure::{ConfigureError, VariantConfigurator};
use crate::ops::licenses::{Aggregation, AggregationError, LicenseAggregator};
use crate::ops::provision::{ArtifactProvisioner, ProvisionError, ResolvedArtifact};
use crate::ops::version::{VersionInfo, VersionOracle};
use crate::sources::describe::Describe;
use crate::sources::fetch::{Fetcher, HttpFetcher};
use crate::util::fs::{remove_file_if_exists, write_string};
use crate::util::GlobalContext;

/// Orchestration step names, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Version,
    Licenses,
    Provision,
    Configure,
    Manifest,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Step::Version => "version",
            Step::Licenses => "licenses",
            Step::Provision => "provision",
            Step::Configure => "configure",
            Step::Manifest => "manifest",
        };
        f.write_str(name)
    }
}

/// A preparation step failed; native compilation must not start.
#[derive(Debug, Error, Diagnostic)]
pub enum PrepareError {
    #[error("version derivation failed")]
    #[diagnostic(code(gantry::prepare::version))]
    Version(
        #[source]
        #[diagnostic_source]
        VersionError,
    ),

    #[error("license aggregation failed")]
    #[diagnostic(code(gantry::prepare::licenses))]
    Licenses(
        #[source]
        #[diagnostic_source]
        AggregationError,
    ),

    #[error("dependency provisioning failed")]
    #[diagnostic(code(gantry::prepare::provision))]
    Provision(
        #[source]
        #[diagnostic_source]
        ProvisionError,
    ),

    #[error("native configuration failed")]
    #[diagnostic(code(gantry::prepare::configure))]
    Configure(
        #[source]
        #[diagnostic_source]
        ConfigureError,
    ),

    #[error("invalid dependency configuration")]
    #[diagnostic(code(gantry::prepare::dependency))]
    Dependency(#[source] anyhow::Error),

    #[error("failed to write build info")]
    #[diagnostic(code(gantry::prepare::manifest))]
    Manifest(#[source] anyhow::Error),
}

impl PrepareError {
    /// The step that failed.
    pub fn step(&self) -> Step {
        match self {
            PrepareError::Version(_) => Step::Version,
            PrepareError::Licenses(_) => Step::Licenses,
            PrepareError::Provision(_) | PrepareError::Dependency(_) => Step::Provision,
            PrepareError::Configure(_) => Step::Configure,
            PrepareError::Manifest(_) => Step::Manifest,
        }
    }
}

/// Everything produced before native compilation.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub variant: BuildVariant,
    pub version: VersionInfo,
    pub licenses: Aggregation,
    pub dependency: ResolvedArtifact,
    pub parameters: NativeBuildParameters,
    pub build_info: PathBuf,
}

/// Serialized form of a [`BuildContext`] for packaging.
#[derive(Debug, Serialize)]
pub struct BuildInfo<'a> {
    pub variant: BuildVariant,
    pub version_code: Option<u32>,
    pub version_string: Option<&'a str>,
    pub application_id: &'a str,
    pub display_name: &'a str,
    pub native_targets: &'a [String],
    pub cmake_args: Vec<String>,
    pub dependency: &'a ResolvedArtifact,
    pub licenses: Vec<&'a Path>,
}

impl<'a> BuildInfo<'a> {
    pub fn new(ctx: &'a BuildContext) -> Self {
        BuildInfo {
            variant: ctx.variant,
            version_code: ctx.version.code.map(|c| c.get()),
            version_string: ctx.version.string.as_deref(),
            application_id: &ctx.parameters.application_id,
            display_name: &ctx.parameters.display_name,
            native_targets: &ctx.parameters.targets,
            cmake_args: ctx.parameters.cmake_args(),
            dependency: &ctx.dependency,
            licenses: ctx.licenses.outputs.iter().map(PathBuf::as_path).collect(),
        }
    }
}

/// Composes version derivation, license aggregation, provisioning, and
/// variant configuration.
pub struct BuildCoordinator<'a, D, F> {
    ctx: &'a GlobalContext,
    describer: D,
    fetcher: F,
}

impl<'a> BuildCoordinator<'a, Box<dyn Describe>, Box<dyn Fetcher>> {
    /// Coordinator using the configured describe backend and HTTP downloads.
    pub fn from_context(ctx: &'a GlobalContext, progress: bool) -> anyhow::Result<Self> {
        let config = ctx.config();
        let describer = config.version.backend.describer(ctx.root());
        let fetcher: Box<dyn Fetcher> = Box::new(
            HttpFetcher::new(Duration::from_secs(config.net.timeout_secs))
                .context("failed to set up downloads")?
                .with_progress(progress),
        );

        Ok(BuildCoordinator::new(ctx, describer, fetcher))
    }
}

impl<'a, D: Describe, F: Fetcher> BuildCoordinator<'a, D, F> {
    pub fn new(ctx: &'a GlobalContext, describer: D, fetcher: F) -> Self {
        BuildCoordinator {
            ctx,
            describer,
            fetcher,
        }
    }

    /// Run every preparation step for `variant`.
    ///
    /// A manifest from an earlier run is removed first, so a failed run
    /// never leaves one behind.
    pub fn prepare(&self, variant: BuildVariant) -> Result<BuildContext, PrepareError> {
        let config = self.ctx.config();
        let root = self.ctx.root();

        remove_file_if_exists(&self.ctx.build_info_path()).map_err(PrepareError::Manifest)?;

        let configurator =
            VariantConfigurator::new(config.native.clone()).map_err(PrepareError::Configure)?;
        let artifact = config
            .dependency_artifact(root)
            .map_err(PrepareError::Dependency)?;

        let oracle = VersionOracle::new(&self.describer, &config.version.tag_pattern);
        let aggregator = LicenseAggregator::new(config.license_output_dir(root));
        let provisioner = ArtifactProvisioner::new(&self.fetcher).offline(config.net.offline);
        let license_dir = config.license_source_dir(root);

        let ((version, licenses), dependency) = rayon::join(
            || {
                rayon::join(
                    || oracle.derive_version_info(),
                    || aggregator.aggregate(&license_dir, &config.licenses.include),
                )
            },
            || provisioner.ensure_artifact(&artifact),
        );

        let dependency = dependency.map_err(PrepareError::Provision)?;
        let licenses = licenses.map_err(PrepareError::Licenses)?;
        let version = version.map_err(PrepareError::Version)?;

        let parameters = configurator.configure(variant, dependency.path.clone());

        let ctx = BuildContext {
            variant,
            version,
            licenses,
            dependency,
            parameters,
            build_info: self.ctx.build_info_path(),
        };

        write_build_info(&ctx).map_err(PrepareError::Manifest)?;
        Ok(ctx)
    }
}

fn write_build_info(ctx: &BuildContext) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(&BuildInfo::new(ctx))
        .context("failed to serialize build info")?;
    write_string(&ctx.build_info, &format!("{}\n", json))
}
