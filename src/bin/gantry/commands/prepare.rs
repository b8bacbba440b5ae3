//! `gantry prepare` command

use std::time::Instant;

use anyhow::Result;

use crate::cli::PrepareArgs;
use crate::commands::{report_dependency, report_version};
use crate::GlobalOptions;
use gantry::ops::{BuildCoordinator, BuildInfo};
use gantry::util::shell::{format_duration, Status};

pub fn execute(args: PrepareArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let start = Instant::now();

    shell.status(
        Status::Preparing,
        format!("{} ({})", ctx.root().display(), args.variant),
    );

    let built = BuildCoordinator::from_context(&ctx, opts.progress())?.prepare(args.variant)?;

    report_dependency(shell, &ctx.config().dependency.name, &built.dependency);
    report_version(shell, &built.version);

    shell.json_event(&serde_json::json!({
        "reason": "prepared",
        "build_info_path": built.build_info,
        "build_info": BuildInfo::new(&built),
    }));
    shell.status(
        Status::Finished,
        format!(
            "{} in {}",
            built.build_info.display(),
            format_duration(start.elapsed())
        ),
    );

    Ok(())
}
