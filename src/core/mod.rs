//! Core data structures for Gantry.
//!
//! This module contains the value types the build preparation steps
//! produce and consume:
//! - Version identity and version codes
//! - Third-party dependency artifacts
//! - License entries and their normalization rules
//! - Native build variants and parameter sets

pub mod artifact;
pub mod license;
pub mod variant;
pub mod version;

pub use artifact::{ArtifactState, DependencyArtifact};
pub use license::LicenseEntry;
pub use variant::{BaseParameters, BuildVariant, NativeBuildParameters};
pub use version::{VersionCode, VersionError, VersionIdentity};
