//! `gantry licenses` command

use anyhow::Result;

use crate::GlobalOptions;
use gantry::ops::LicenseAggregator;
use gantry::util::diagnostic::{self, Diagnostic};
use gantry::util::fs::relative_path;
use gantry::util::shell::Status;

pub fn execute(opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let config = ctx.config();

    let source_dir = config.license_source_dir(ctx.root());
    let aggregator = LicenseAggregator::new(config.license_output_dir(ctx.root()));
    let result = aggregator.aggregate(&source_dir, &config.licenses.include)?;

    if result.entries.is_empty() && !shell.is_quiet() && !shell.is_json() {
        let warning = Diagnostic::warning("no license files were bundled")
            .with_context(format!(
                "nothing in {} matches `{}`",
                relative_path(ctx.cwd(), &source_dir).display(),
                config.licenses.include
            ))
            .with_suggestion("add license texts there, or set `licenses.source_dir` and `licenses.include` in Gantry.toml");
        diagnostic::emit(&warning, shell.use_color());
    }

    if shell.is_verbose() {
        for output in &result.outputs {
            shell.status(
                Status::Created,
                relative_path(ctx.cwd(), output).display(),
            );
        }
    }

    shell.json_event(&serde_json::json!({
        "reason": "licenses",
        "output_dir": aggregator.output_dir(),
        "entries": result.entries,
        "outputs": result.outputs,
    }));
    shell.status(
        Status::Finished,
        format!(
            "{} license file(s) in {}",
            result.entries.len(),
            relative_path(ctx.cwd(), aggregator.output_dir()).display()
        ),
    );

    Ok(())
}
