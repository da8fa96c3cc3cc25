//! dynamap CLI entry point
//!
//! Installs the log subscriber (stderr, filtered by `RUST_LOG`), then
//! delegates to `cli::run`. Errors go to stderr with a non-zero exit.

use dynamap::cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
