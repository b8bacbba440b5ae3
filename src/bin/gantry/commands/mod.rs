//! Command implementations

pub mod build;
pub mod completions;
pub mod configure;
pub mod fetch;
pub mod licenses;
pub mod prepare;
pub mod version;

use gantry::ops::{ProvisionAction, ResolvedArtifact, VersionInfo};
use gantry::util::shell::{Shell, Status};

/// Report what provisioning did.
pub fn report_dependency(shell: &Shell, name: &str, resolved: &ResolvedArtifact) {
    match resolved.action {
        ProvisionAction::Skipped => shell.status(
            Status::Skipped,
            format!("fetching `{}`, already present at {}", name, resolved.path.display()),
        ),
        ProvisionAction::Fetched { bytes } => shell.status(
            Status::Created,
            format!("{} ({} KiB downloaded)", resolved.path.display(), bytes / 1024),
        ),
    }
}

/// Warn about absent version outputs; they never fail a command.
pub fn report_version(shell: &Shell, info: &VersionInfo) {
    if info.code.is_none() {
        shell.warn("version code unavailable; no matching release tag in history");
    }
    if info.string.is_none() {
        shell.warn("version string unavailable");
    }
}
