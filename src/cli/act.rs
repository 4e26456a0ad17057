use std::path::{Path, PathBuf};

use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::info;

use navkit_pipeline::PipelineError;

#[derive(Args, Debug)]
pub struct ActArgs {
    /// Natural-language step, e.g. `Click on "Submit"`.
    pub step: String,

    /// Page URL to scope the snapshot to; defaults to the fixture's own URL.
    #[arg(long)]
    pub url: Option<String>,
}

pub async fn run(
    config: &Option<PathBuf>,
    state_dir: &Path,
    fixture: &Path,
    args: ActArgs,
) -> anyhow::Result<i32> {
    let (pipeline, driver) = super::bootstrap(config, state_dir, fixture)?;
    let cancel = CancellationToken::new();

    match pipeline.act(&driver, &args.step, args.url, &cancel).await {
        Ok(result) => {
            info!(selector = %result.selector, success = result.success, "acted");
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(if result.success { 0 } else { 1 })
        }
        Err(PipelineError::NoCandidate) => {
            eprintln!("no candidate above minimum confidence");
            Ok(2)
        }
        Err(err) => {
            eprintln!("{err}");
            Ok(1)
        }
    }
}
