use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct StatsArgs {}

pub async fn run(
    config: &Option<PathBuf>,
    state_dir: &Path,
    fixture: &Path,
    _args: StatsArgs,
) -> anyhow::Result<i32> {
    let (pipeline, _driver) = super::bootstrap(config, state_dir, fixture)?;
    println!("{}", serde_json::to_string_pretty(&pipeline.stats())?);
    Ok(0)
}
