use clap::Parser;
use explorer_app::{logging, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::initialize(cli.log.into(), cli.log_level());
    explorer_app::run(cli)
}
