//! Native build variants and their parameter sets.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Deployment mode of the native runtime.
///
/// Exactly one variant is active per build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildVariant {
    /// Runtime is loaded into the client process; no service daemon.
    InProcess,
    /// Runtime talks to a separate service daemon.
    OutOfProcess,
}

impl BuildVariant {
    pub const ALL: [BuildVariant; 2] = [BuildVariant::InProcess, BuildVariant::OutOfProcess];

    /// Canonical CLI token.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildVariant::InProcess => "in-process",
            BuildVariant::OutOfProcess => "out-of-process",
        }
    }

    /// Value of the service feature flag.
    pub fn service_enabled(&self) -> bool {
        match self {
            BuildVariant::InProcess => false,
            BuildVariant::OutOfProcess => true,
        }
    }

    /// Suffix appended to the base application id.
    pub fn app_id_suffix(&self) -> &'static str {
        match self {
            BuildVariant::InProcess => ".in_process",
            BuildVariant::OutOfProcess => ".out_of_process",
        }
    }
}

impl fmt::Display for BuildVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BuildVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-process" | "in_process" | "inProcess" => Ok(BuildVariant::InProcess),
            "out-of-process" | "out_of_process" | "outOfProcess" => Ok(BuildVariant::OutOfProcess),
            _ => Err(format!(
                "invalid variant '{}'; expected 'in-process' or 'out-of-process'",
                s
            )),
        }
    }
}

/// Parameters shared by every variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseParameters {
    /// Minimum platform API level.
    pub platform: u32,

    /// Standard-library flavor.
    pub stl: String,

    /// Hardware-acceleration definitions, `NAME=VALUE`.
    pub acceleration: Vec<String>,

    /// CMake variable receiving the dependency include path.
    pub include_var: String,

    /// Resolved include path of the provisioned dependency.
    pub include_dir: PathBuf,

    /// Name of the service feature flag.
    pub feature_flag: String,

    /// Target every variant builds.
    pub primary_target: String,

    /// Base application id, before the variant suffix.
    pub application_id: String,
}

/// Complete parameter set handed to the native backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeBuildParameters {
    pub variant: BuildVariant,
    pub base: BaseParameters,
    pub service_enabled: bool,
    pub targets: Vec<String>,
    pub application_id: String,
    pub display_name: String,
}

impl NativeBuildParameters {
    /// Render as CMake `-D` arguments.
    pub fn cmake_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("-DANDROID_PLATFORM={}", self.base.platform),
            format!("-DANDROID_STL={}", self.base.stl),
        ];
        args.extend(self.base.acceleration.iter().map(|a| format!("-D{}", a)));
        args.push(format!(
            "-D{}={}",
            self.base.include_var,
            self.base.include_dir.display()
        ));
        args.push(format!(
            "-D{}={}",
            self.base.feature_flag,
            if self.service_enabled { "ON" } else { "OFF" }
        ));
        args
    }
}
