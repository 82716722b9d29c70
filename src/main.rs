use anyhow::Result;
use clap::Parser;
use procsum::cli::{setup, Cli};

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup::init_logging(cli.verbosity);
    procsum::commands::run(cli)
}
