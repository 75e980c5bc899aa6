use clap::Parser;
use stampede_runtime::{StampedeCli, StampedeRuntime};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = StampedeCli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log));
    FmtSubscriber::builder().with_env_filter(filter).init();

    StampedeRuntime::new(cli).run().await
}
