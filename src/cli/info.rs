use std::path::{Path, PathBuf};

use clap::Args;

#[derive(Args, Debug)]
pub struct InfoArgs {}

pub async fn run(
    config: &Option<PathBuf>,
    state_dir: &Path,
    fixture: &Path,
    _args: InfoArgs,
) -> anyhow::Result<i32> {
    println!("navkit {}", env!("CARGO_PKG_VERSION"));
    println!("Build Date: {}", env!("BUILD_DATE", "unknown"));
    println!("Git Commit: {}", env!("GIT_HASH", "unknown"));
    println!("Git Branch: {}", env!("GIT_BRANCH", "unknown"));
    println!();

    let (pipeline, _driver) = super::bootstrap(config, state_dir, fixture)?;
    println!("State Directory: {}", state_dir.display());
    println!("Fixture: {}", fixture.display());
    println!();
    println!("{}", serde_json::to_string_pretty(&pipeline.stats())?);
    Ok(0)
}
