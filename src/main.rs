use clap::Parser;
use std::process;
use todo::cli::{self, Cli};
use tracing_subscriber::EnvFilter;

fn main() {
    // Logs go to stderr so stdout stays scriptable.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = cli::run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
