use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod error;

type Result<T> = std::result::Result<T, error::Error>;

/// Logs go to stderr, stdout is reserved for output. Only warnings unless `RUST_LOG` is set.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub async fn run() {
    init_tracing();

    let cli = cli::Cli::parse();
    cli.run().await;
}
