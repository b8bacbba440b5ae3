//! `gantry fetch` command

use std::time::Duration;

use anyhow::Result;

use crate::commands::report_dependency;
use crate::GlobalOptions;
use gantry::core::ArtifactState;
use gantry::ops::ArtifactProvisioner;
use gantry::sources::HttpFetcher;
use gantry::util::shell::Status;

pub fn execute(opts: &GlobalOptions) -> Result<()> {
    let shell = &opts.shell;
    let ctx = opts.context()?;
    let config = ctx.config();
    let artifact = config.dependency_artifact(ctx.root())?;

    if artifact.state() == ArtifactState::Absent && !config.net.offline {
        shell.status(
            Status::Fetching,
            format!("{} v{} ({})", artifact.name, artifact.version, artifact.remote_url),
        );
    }

    let fetcher = HttpFetcher::new(Duration::from_secs(config.net.timeout_secs))?
        .with_progress(opts.progress());
    let resolved = ArtifactProvisioner::new(fetcher)
        .offline(config.net.offline)
        .ensure_artifact(&artifact)?;

    report_dependency(shell, &artifact.name, &resolved);
    shell.json_event(&serde_json::json!({
        "reason": "dependency",
        "name": artifact.name,
        "version": artifact.version,
        "resolved": resolved,
    }));

    Ok(())
}
