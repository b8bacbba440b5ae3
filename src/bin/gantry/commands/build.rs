//! `gantry build` command

use std::time::Instant;

use anyhow::Result;

use crate::cli::BuildArgs;
use crate::commands::{report_dependency, report_version};
use crate::GlobalOptions;
use gantry::builder::cmake::require_cmake_project;
use gantry::builder::CMakeBackend;
use gantry::ops::BuildCoordinator;
use gantry::util::shell::{format_duration, Status};

pub fn execute(args: BuildArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let start = Instant::now();

    let source_dir = ctx.config().native_source_dir(ctx.root());
    require_cmake_project(&source_dir)?;

    let built = BuildCoordinator::from_context(&ctx, opts.progress())?.prepare(args.variant)?;
    report_dependency(shell, &ctx.config().dependency.name, &built.dependency);
    report_version(shell, &built.version);

    shell.status(
        Status::Building,
        format!("{} ({})", built.parameters.targets.join(", "), args.variant),
    );

    let backend = CMakeBackend::new(source_dir, &ctx.build_dir(), args.variant).release(args.release);
    backend.run(&built.parameters)?;

    shell.json_event(&serde_json::json!({
        "reason": "build-finished",
        "variant": args.variant,
        "targets": built.parameters.targets,
        "build_dir": backend.build_dir(),
    }));
    shell.status(
        Status::Finished,
        format!(
            "{} {} in {}",
            if args.release { "release" } else { "debug" },
            built.parameters.display_name,
            format_duration(start.elapsed())
        ),
    );

    Ok(())
}
