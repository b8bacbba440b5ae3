//! Gantry CLI

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use gantry::util::diagnostic::{self, Diagnostic};
use gantry::util::shell::Shell;
use gantry::util::GlobalContext;

mod cli;
mod commands;

use cli::{Cli, Commands, MessageFormat};

/// Options shared by every command.
pub struct GlobalOptions {
    pub shell: Shell,
    pub root: Option<PathBuf>,
    pub offline: bool,
}

impl GlobalOptions {
    fn from_cli(cli: &Cli) -> Self {
        GlobalOptions {
            shell: Shell::from_flags(
                cli.quiet,
                cli.verbose,
                cli.color_choice(),
                cli.message_format == MessageFormat::Json,
            ),
            root: cli.root.clone(),
            offline: cli.offline,
        }
    }

    /// Load the context for the repository, with CLI overrides applied.
    pub fn context(&self) -> Result<GlobalContext> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        let mut ctx = match self.root {
            Some(ref root) => GlobalContext::with_root(cwd, root.clone())?,
            None => GlobalContext::discover(cwd)?,
        };

        if self.offline {
            ctx.config_mut().net.offline = true;
        }
        Ok(ctx)
    }

    /// Whether download progress should be drawn.
    pub fn progress(&self) -> bool {
        !self.shell.is_quiet() && !self.shell.is_json()
    }
}

fn main() {
    let cli = Cli::parse();
    let opts = GlobalOptions::from_cli(&cli);
    init_logging(&cli, &opts.shell);

    if let Err(e) = run(cli.command, &opts) {
        if opts.shell.is_json() {
            opts.shell.error(format!("{:#}", e));
        } else {
            diagnostic::emit(&Diagnostic::from_error(&e), opts.shell.use_color());
        }
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli, shell: &Shell) {
    let default = if cli.verbose {
        "gantry=debug"
    } else if cli.quiet {
        "gantry=error"
    } else {
        "gantry=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_ansi(shell.use_color())
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, opts: &GlobalOptions) -> Result<()> {
    match command {
        Commands::Prepare(args) => commands::prepare::execute(args, opts),
        Commands::Version(args) => commands::version::execute(args, opts),
        Commands::Fetch => commands::fetch::execute(opts),
        Commands::Licenses => commands::licenses::execute(opts),
        Commands::Configure(args) => commands::configure::execute(args, opts),
        Commands::Build(args) => commands::build::execute(args, opts),
        Commands::Completions(args) => commands::completions::execute(args),
    }
}
