use anyhow::Result;
use clap::Parser;
use saldo::cli::Cli;
use simple_logger::SimpleLogger;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    SimpleLogger::new()
        .with_level(cli.log_level())
        .env()
        .init()?;

    log::debug!("Configuration: {:?}", cli);
    cli.run().await
}
