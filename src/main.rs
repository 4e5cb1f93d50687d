//! krishi CLI entry point

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    // API keys may live in a local .env
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = krishi_sahayak::cli::Cli::parse();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(krishi_sahayak::cli::run(cli))
}
