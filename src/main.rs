use clap::Parser;
use compliant_cache::cli::{self, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    cli::cache::run(cli.command)
}
