//! Variant configuration.
//!
//! Maps a [`BuildVariant`] onto a complete [`NativeBuildParameters`] set.
//! Variants only extend the shared base: they add native targets and set
//! the feature flag, never remove or override base parameters.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::core::{BaseParameters, BuildVariant, NativeBuildParameters};
use crate::util::config::NativeConfig;

/// The native configuration cannot produce disjoint variants.
#[derive(Debug, Error, Diagnostic, PartialEq, Eq)]
pub enum ConfigureError {
    #[error("native target name for `{role}` is empty")]
    #[diagnostic(code(gantry::configure::empty_target))]
    EmptyTarget { role: &'static str },

    #[error("service target `{0}` is the same as the primary target")]
    #[diagnostic(
        code(gantry::configure::shared_targets),
        help("variants must build different target sets; pick a distinct `native.service_target`")
    )]
    SharedTargets(String),
}

/// Produces native build parameters for a variant.
#[derive(Debug, Clone)]
pub struct VariantConfigurator {
    native: NativeConfig,
}

impl VariantConfigurator {
    /// Validate the native configuration.
    pub fn new(native: NativeConfig) -> Result<Self, ConfigureError> {
        if native.primary_target.trim().is_empty() {
            return Err(ConfigureError::EmptyTarget { role: "primary" });
        }
        if native.service_target.trim().is_empty() {
            return Err(ConfigureError::EmptyTarget { role: "service" });
        }
        if native.primary_target == native.service_target {
            return Err(ConfigureError::SharedTargets(native.service_target));
        }
        Ok(VariantConfigurator { native })
    }

    /// Shared base parameters, given the resolved dependency include path.
    pub fn base(&self, include_dir: PathBuf) -> BaseParameters {
        BaseParameters {
            platform: self.native.platform,
            stl: self.native.stl.clone(),
            acceleration: self.native.acceleration.clone(),
            include_var: self.native.include_var.clone(),
            include_dir,
            feature_flag: self.native.feature_flag.clone(),
            primary_target: self.native.primary_target.clone(),
            application_id: self.native.application_id.clone(),
        }
    }

    /// Parameters for `variant`.
    pub fn configure(&self, variant: BuildVariant, include_dir: PathBuf) -> NativeBuildParameters {
        let base = self.base(include_dir);

        let mut targets = vec![base.primary_target.clone()];
        match variant {
            BuildVariant::InProcess => {}
            BuildVariant::OutOfProcess => targets.push(self.native.service_target.clone()),
        }

        NativeBuildParameters {
            variant,
            service_enabled: variant.service_enabled(),
            targets,
            application_id: format!("{}{}", base.application_id, variant.app_id_suffix()),
            display_name: self.native.display_names.for_variant(variant).to_string(),
            base,
        }
    }
}
