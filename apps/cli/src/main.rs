//! ipcatalog CLI — aggregate scattered address lists into a regional catalog.
//!
//! Fetches the configured sources, deduplicates and enriches the extracted
//! addresses, and writes the grouped catalog file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
