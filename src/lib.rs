//! Gantry - build preparation for a native Android runtime
//!
//! This crate derives version identity from repository history, provisions
//! the third-party source dependency, bundles license texts, and produces
//! per-variant native build parameters.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test doubles and fixtures for unit tests.
#[cfg(test)]
pub mod test_support;

pub use core::{BuildVariant, NativeBuildParameters, VersionCode, VersionIdentity};
pub use ops::{BuildContext, BuildCoordinator, PrepareError};
pub use util::context::GlobalContext;
