//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use gantry::core::BuildVariant;
use gantry::util::shell::ColorChoice;

/// Gantry - build preparation for a native Android runtime
#[derive(Parser)]
#[command(name = "gantry")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Disable colored output (same as --color never)
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Output format for messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    /// Repository root (defaults to the nearest directory with Gantry.toml or .git)
    #[arg(long, global = true, env = "GANTRY_ROOT")]
    pub root: Option<PathBuf>,

    /// Never download; fail if the dependency is not already present
    #[arg(long, global = true, env = "GANTRY_OFFLINE")]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Effective color choice; `--no-color` wins over `--color`.
    pub fn color_choice(&self) -> ColorChoice {
        if self.no_color {
            ColorChoice::Never
        } else {
            self.color
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run every preparation step and write build-info.json
    Prepare(PrepareArgs),

    /// Print the version code and version string
    Version(VersionArgs),

    /// Provision the third-party dependency
    Fetch,

    /// Bundle license texts as resource files
    Licenses,

    /// Print the native build parameters for a variant
    Configure(ConfigureArgs),

    /// Prepare, then build the variant's native targets with CMake
    Build(BuildArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct PrepareArgs {
    /// Build variant
    #[arg(long, default_value_t = BuildVariant::OutOfProcess)]
    pub variant: BuildVariant,
}

#[derive(Args)]
pub struct VersionArgs {
    /// Print only the version code
    #[arg(long, conflicts_with = "string")]
    pub code: bool,

    /// Print only the version string
    #[arg(long)]
    pub string: bool,
}

#[derive(Args)]
pub struct ConfigureArgs {
    /// Build variant
    #[arg(long, default_value_t = BuildVariant::OutOfProcess)]
    pub variant: BuildVariant,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Build variant
    #[arg(long, default_value_t = BuildVariant::OutOfProcess)]
    pub variant: BuildVariant,

    /// Build in release mode
    #[arg(short, long)]
    pub release: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}
