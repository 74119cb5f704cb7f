mod api;
mod cli;
mod config;
mod poller;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // Initialize logging (stderr, so JSON output on stdout stays clean)
    let default_filter = if cli.output.verbose {
        "walletdash=debug,info"
    } else {
        "walletdash=info,warn"
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("Starting walletdash {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = cli::run(cli).await {
        tracing::debug!("Command failed: {:?}", e);
        cli::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}
