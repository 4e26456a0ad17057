use clap::Parser;
use tracing_subscriber::EnvFilter;

use navkit_cli::cli::{self, Cli};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let code = match cli::run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("navkit: {err:?}");
            1
        }
    };
    std::process::exit(code);
}
