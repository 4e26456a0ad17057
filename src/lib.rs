//! CLI facade over `navkit-pipeline`: config loading, a recorded-fixture
//! driver for offline use, and the `query`/`act`/`stats` subcommands.

pub mod cli;
pub mod config;
pub mod fixture;
pub mod model;
