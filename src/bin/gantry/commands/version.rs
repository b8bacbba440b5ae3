//! `gantry version` command
//!
//! Prints the version code and version string derived from repository
//! history. Absent values are reported but never fail the command.

use anyhow::Result;

use crate::cli::VersionArgs;
use crate::commands::report_version;
use crate::GlobalOptions;
use gantry::ops::VersionOracle;

const UNAVAILABLE: &str = "(unavailable)";

pub fn execute(args: VersionArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let config = ctx.config();

    let describer = config.version.backend.describer(ctx.root());
    let info = VersionOracle::new(describer, &config.version.tag_pattern).derive_version_info()?;

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "version",
            "code": info.code,
            "string": info.string,
        }));
        return Ok(());
    }

    report_version(shell, &info);

    if args.code {
        if let Some(code) = info.code {
            println!("{}", code);
        }
    } else if args.string {
        if let Some(ref string) = info.string {
            println!("{}", string);
        }
    } else {
        let code = info.code.map(|c| c.to_string());
        println!("code    {}", code.as_deref().unwrap_or(UNAVAILABLE));
        println!("string  {}", info.string.as_deref().unwrap_or(UNAVAILABLE));
    }

    Ok(())
}
