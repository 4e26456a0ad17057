pub mod act;
pub mod info;
pub mod query;
pub mod stats;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "navkit", about = "Natural-language element retrieval and action resolution")]
pub struct Cli {
    /// Path to a PipelineConfig file (JSON or YAML). Defaults to the built-in defaults.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory the Vector Cache and Promotion Store persist to.
    #[arg(long, global = true, default_value = "./navkit-state")]
    pub state_dir: PathBuf,

    /// Recorded fixture (JSON/YAML) to drive against instead of a live browser.
    #[arg(long, global = true)]
    pub fixture: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve a step to a selector without acting on the page.
    Query(query::QueryArgs),
    /// Resolve a step and execute the resulting action.
    Act(act::ActArgs),
    /// Print session/cache/healing/promotion counters.
    Stats(stats::StatsArgs),
    /// Print version, build, and session information.
    Info(info::InfoArgs),
}

/// Builds the pipeline and the recorded-fixture driver shared by every
/// subcommand. Returns the driver alongside the pipeline since `Driver`
/// calls borrow it for the lifetime of the `query`/`act` call.
pub(crate) fn bootstrap(
    config_path: &Option<PathBuf>,
    state_dir: &std::path::Path,
    fixture_path: &std::path::Path,
) -> anyhow::Result<(navkit_pipeline::NavPipeline, crate::fixture::ReplayDriver)> {
    let config = crate::config::load(config_path.as_deref())?;
    let fixture = crate::fixture::load(fixture_path)?;
    let initial_url = fixture.frame_url.clone();
    let driver = crate::fixture::ReplayDriver::new(fixture);

    let model = crate::model::NullEmbeddingModel::new(64);
    let pipeline = navkit_pipeline::NavPipeline::bootstrap(state_dir.to_path_buf(), model, initial_url, config)
        .map_err(|err| anyhow::anyhow!("bootstrapping pipeline: {err}"))?;

    Ok((pipeline, driver))
}

pub async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Command::Query(args) => query::run(&cli.config, &cli.state_dir, &cli.fixture, args).await,
        Command::Act(args) => act::run(&cli.config, &cli.state_dir, &cli.fixture, args).await,
        Command::Stats(args) => stats::run(&cli.config, &cli.state_dir, &cli.fixture, args).await,
        Command::Info(args) => info::run(&cli.config, &cli.state_dir, &cli.fixture, args).await,
    }
}
