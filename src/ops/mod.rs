//! High-level operations.
//!
//! Each submodule implements one preparation step; [`prepare`] composes
//! them for a build.

pub mod configure;
pub mod licenses;
pub mod prepare;
pub mod provision;
pub mod version;

pub use configure::{ConfigureError, VariantConfigurator};
pub use licenses::{Aggregation, AggregationError, FileFailure, LicenseAggregator};
pub use prepare::{BuildContext, BuildCoordinator, BuildInfo, PrepareError, Step};
pub use provision::{ArtifactProvisioner, ProvisionAction, ProvisionError, ResolvedArtifact};
pub use version::{VersionInfo, VersionOracle};
