//! Version derivation from repository history.
//!
//! The version code and the version string come from two separate describe
//! queries and are never unified:
//! - the code uses a strict long-form query without dirty detection, so
//!   uncommitted changes never move it;
//! - the string uses a lenient dirty-aware query and is passed through as-is.

use serde::Serialize;

use crate::core::{VersionCode, VersionError, VersionIdentity};
use crate::sources::describe::{Describe, DescribeQuery};

/// Both version outputs; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VersionInfo {
    pub code: Option<VersionCode>,
    pub string: Option<String>,
}

/// Derives version identity from repository history.
pub struct VersionOracle<D> {
    describer: D,
    tag_pattern: String,
}

impl<D: Describe> VersionOracle<D> {
    pub fn new(describer: D, tag_pattern: impl Into<String>) -> Self {
        VersionOracle {
            describer,
            tag_pattern: tag_pattern.into(),
        }
    }

    /// Parse the long-form describe output into a version identity.
    ///
    /// `Ok(None)` when no version is available.
    pub fn derive_identity(&self) -> Result<Option<VersionIdentity>, VersionError> {
        let query = DescribeQuery::long(&self.tag_pattern);
        let output = match self.describer.describe(&query) {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("version code unavailable: {:#}", e);
                return Ok(None);
            }
        };

        let identity = VersionIdentity::parse(&output)?;
        if identity.is_none() {
            tracing::warn!(
                "version code unavailable: `{}` does not match `v<major>.<minor>.<patch>-<commits>-g<hash>` (no reachable `{}` tag?)",
                output,
                self.tag_pattern
            );
        }
        Ok(identity)
    }

    /// Derive the numeric version code.
    pub fn derive_version_code(&self) -> Result<Option<VersionCode>, VersionError> {
        Ok(self.derive_identity()?.map(|id| id.version_code()))
    }

    /// Derive the human-readable version string.
    pub fn derive_version_string(&self) -> Option<String> {
        let query = DescribeQuery::dirty(&self.tag_pattern);
        match self.describer.describe(&query) {
            Ok(output) => Some(output.trim().to_string()).filter(|s| !s.is_empty()),
            Err(e) => {
                tracing::warn!("version string unavailable: {:#}", e);
                None
            }
        }
    }

    /// Derive both outputs.
    pub fn derive_version_info(&self) -> Result<VersionInfo, VersionError> {
        Ok(VersionInfo {
            code: self.derive_version_code()?,
            string: self.derive_version_string(),
        })
    }
}
