use anyhow::Result;
use clap::Parser;
use house_price_predictor::cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli   = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("house_price_predictor={level}").parse()?),
        )
        .init();

    cli.run().await
}
