//! Command implementations

mod config;
mod depth;
mod locate;
mod profile;
mod search;
mod stats;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.global.json);
    let global = &cli.global;

    match cli.command {
        Commands::Locate(args) => locate::execute(args, global, &output).await,
        Commands::Profile(args) => profile::execute(args, global, &output).await,
        Commands::Stats(args) => stats::execute(args, global, &output).await,
        Commands::Depth(args) => depth::execute(args, global, &output).await,
        Commands::Search(args) => search::execute(args, global, &output).await,
        Commands::Config => config::execute(global, &output),
    }
}
