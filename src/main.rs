//! Roster CLI: import a directory of person batch files; use --dry-run to parse without storing.

use anyhow::Result;
use clap::Parser;
use roster::engine::arg_parser::Cli;
use roster::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
