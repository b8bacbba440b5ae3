//! CMake backend for the native build.
//!
//! Configures the native project in a per-variant build tree with the
//! variant's parameters, then builds exactly the variant's targets.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{bail, Result};
use miette::Diagnostic;
use thiserror::Error;

use crate::core::{BuildVariant, NativeBuildParameters};
use crate::util::fs::ensure_dir;
use crate::util::process::{find_cmake, ProcessBuilder};

/// Drives `cmake` for one variant.
#[derive(Debug, Clone)]
pub struct CMakeBackend {
    source_dir: PathBuf,
    build_dir: PathBuf,
    release: bool,
    program: Option<PathBuf>,
}

impl CMakeBackend {
    /// Backend for `variant`, building under `<build_root>/cmake/<variant>`.
    pub fn new(source_dir: impl Into<PathBuf>, build_root: &Path, variant: BuildVariant) -> Self {
        CMakeBackend {
            source_dir: source_dir.into(),
            build_dir: build_root.join("cmake").join(variant.as_str()),
            release: false,
            program: None,
        }
    }

    pub fn release(mut self, release: bool) -> Self {
        self.release = release;
        self
    }

    /// Use a specific cmake executable instead of searching `PATH`.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    fn build_type(&self) -> &'static str {
        if self.release {
            "Release"
        } else {
            "Debug"
        }
    }

    fn program(&self) -> Result<PathBuf> {
        if let Some(ref program) = self.program {
            return Ok(program.clone());
        }
        match find_cmake() {
            Some(cmake) => Ok(cmake),
            None => bail!(
                "CMake not found\n\
                 \n\
                 CMake is required to build the native targets.\n\
                 Install CMake and ensure it's in your PATH."
            ),
        }
    }

    /// The configure invocation for `params`.
    pub fn configure_command(&self, params: &NativeBuildParameters) -> Result<ProcessBuilder> {
        Ok(ProcessBuilder::new(self.program()?)
            .arg("-S")
            .arg(&self.source_dir)
            .arg("-B")
            .arg(&self.build_dir)
            .arg(format!("-DCMAKE_BUILD_TYPE={}", self.build_type()))
            .args(params.cmake_args()))
    }

    /// The build invocation for `params`; only the variant's targets are built.
    pub fn build_command(&self, params: &NativeBuildParameters) -> Result<ProcessBuilder> {
        Ok(ProcessBuilder::new(self.program()?)
            .arg("--build")
            .arg(&self.build_dir)
            .arg("--parallel")
            .arg("--config")
            .arg(self.build_type())
            .arg("--target")
            .args(&params.targets))
    }

    /// Configure and build.
    pub fn run(&self, params: &NativeBuildParameters) -> Result<()> {
        ensure_dir(&self.build_dir)?;

        tracing::info!("Configuring {} ({})", params.display_name, params.variant);
        let configure = self.configure_command(params)?;
        check(&configure, configure.status()?)?;

        tracing::info!("Building {}", params.targets.join(", "));
        let build = self.build_command(params)?;
        check(&build, build.status()?)
    }
}

/// A `cmake` invocation exited unsuccessfully.
#[derive(Debug, Error, Diagnostic)]
#[error("`{command}` failed with exit code {code:?}")]
#[diagnostic(
    code(gantry::build::cmake),
    help("run `gantry build --verbose` for more details")
)]
pub struct CommandFailed {
    pub command: String,
    pub code: Option<i32>,
}

fn check(cmd: &ProcessBuilder, status: ExitStatus) -> Result<()> {
    if !status.success() {
        return Err(CommandFailed {
            command: cmd.display_command(),
            code: status.code(),
        }
        .into());
    }
    Ok(())
}

/// Check if a directory contains a CMake project.
pub fn is_cmake_project(dir: &Path) -> bool {
    dir.join("CMakeLists.txt").exists()
}

/// Fail early when `dir` is not a CMake project.
pub fn require_cmake_project(dir: &Path) -> Result<()> {
    if !is_cmake_project(dir) {
        bail!(
            "no CMakeLists.txt in {}\n\
             \n\
             Set `native.source_dir` in Gantry.toml to the native project.",
            dir.display()
        );
    }
    Ok(())
}
