use anyhow::Result;
use clap::Parser;
use packledger::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    packledger::logging::init(cli.verbose);
    cli.run().await
}
