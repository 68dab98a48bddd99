//! limno-cli - Command line tool for lake temperature and velocity data.

use clap::Parser;

#[derive(Parser)]
#[command(
    name = "limno-cli",
    version,
    about = "Retrieve, merge and plot lake simulation and measurement data"
)]
struct Cli {
    #[command(subcommand)]
    command: limno_cmd::Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    limno_cmd::run(cli.command).await
}
