//! `gantry configure` command
//!
//! Shows the parameter set a variant would be built with. Nothing is
//! provisioned: the include path is where provisioning resolves to now.

use anyhow::Result;

use crate::cli::ConfigureArgs;
use crate::GlobalOptions;
use gantry::ops::VariantConfigurator;

pub fn execute(args: ConfigureArgs, opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let config = ctx.config();

    let artifact = config.dependency_artifact(ctx.root())?;
    let params =
        VariantConfigurator::new(config.native.clone())?.configure(args.variant, artifact.include_path());
    let cmake_args = params.cmake_args();

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "configure",
            "parameters": params,
            "cmake_args": cmake_args,
        }));
        return Ok(());
    }

    println!("variant         {}", params.variant);
    println!("application id  {}", params.application_id);
    println!("display name    {}", params.display_name);
    println!("targets         {}", params.targets.join(" "));
    println!("cmake arguments");
    for arg in &cmake_args {
        println!("  {}", arg);
    }

    Ok(())
}
